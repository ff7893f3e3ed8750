use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::logger::error;
use crate::types::{ConvertError, norm_path};

/// Read one part of an ODF container, e.g. `content.xml`.
pub fn read_part(path: &Path, part: &str) -> Result<String, ConvertError> {
    let cannot_read = |detail: String| {
        error(&format!("{}: {}", norm_path(path), detail));
        ConvertError::CannotReadFile(norm_path(path))
    };

    let file = File::open(path).map_err(|e| cannot_read(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| cannot_read(e.to_string()))?;
    let mut entry = archive
        .by_name(part)
        .map_err(|e| cannot_read(format!("{}: {}", part, e)))?;

    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| cannot_read(format!("{}: {}", part, e)))?;
    Ok(contents)
}

/// Like `read_part`, but a missing part gives `None`.
pub fn read_optional_part(path: &Path, part: &str) -> Result<Option<String>, ConvertError> {
    let file = File::open(path).map_err(|_| ConvertError::CannotReadFile(norm_path(path)))?;
    let archive = ZipArchive::new(file).map_err(|_| ConvertError::CannotReadFile(norm_path(path)))?;
    if archive.file_names().any(|n| n == part) {
        read_part(path, part).map(Some)
    } else {
        Ok(None)
    }
}
