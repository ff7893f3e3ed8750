//! yWriter 7 project file: read into a [`Novel`] and merge a [`Novel`] back.

mod reader;
mod writer;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_settings::ConvertSettings;
use crate::logger::error;
use crate::model::Novel;
use crate::types::{ConvertError, norm_path};
use crate::xml_tree::{self, XmlElement};

pub const EXTENSION: &str = ".yw7";

/// Project extension fields.
pub const PRJ_KWVAR: [&str; 2] = ["Field_LanguageCode", "Field_CountryCode"];

/// Scene extension fields.
pub const SCN_KWVAR: [&str; 2] = ["Field_SceneArcs", "Field_SceneStyle"];

/// Fields stored as CDATA, with their text unescaped.
pub const CDATA_TAGS: [&str; 20] = [
    "Title", "AuthorName", "Bio", "Desc", "FieldTitle1", "FieldTitle2", "FieldTitle3",
    "FieldTitle4", "LaTeXHeaderFile", "Tags", "AKA", "ImageFile", "FullName", "Goals",
    "Notes", "RTFFile", "SceneContent", "Outcome", "Goal", "Conflict",
];

pub(crate) fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// A project file on disk, with the tree of the last read kept for merging.
#[derive(Debug)]
pub struct Yw7File {
    pub file_path: PathBuf,
    tree: Option<XmlElement>,
}

impl Yw7File {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Yw7File {
            file_path: file_path.into(),
            tree: None,
        }
    }

    /// yWriter keeps `<project>.lock` while the project is open.
    pub fn is_locked(&self) -> bool {
        append_to_path(&self.file_path, ".lock").is_file()
    }

    pub fn read(&mut self, novel: &mut Novel) -> Result<(), ConvertError> {
        if self.is_locked() {
            return Err(ConvertError::ProjectLocked(norm_path(&self.file_path)));
        }

        let malformed = |detail: String| {
            error(&format!("{}: {}", norm_path(&self.file_path), detail));
            ConvertError::MalformedProjectFile(norm_path(&self.file_path))
        };

        let content = fs::read_to_string(&self.file_path).map_err(|e| malformed(e.to_string()))?;
        let root = xml_tree::parse_str(&content).map_err(|e| malformed(e.to_string()))?;

        if !reader::read_project(&root, novel) {
            return Err(malformed("no PROJECT section".to_string()));
        }
        reader::read_locations(&root, novel);
        reader::read_items(&root, novel);
        reader::read_characters(&root, novel);
        reader::read_projectvars(&root, novel);
        reader::read_projectnotes(&root, novel);
        reader::read_scenes(&root, novel);
        reader::read_chapters(&root, novel);
        reader::adjust_scene_types(novel);

        tracing::info!(
            "Read {}: {} chapters, {} scenes",
            norm_path(&self.file_path),
            novel.chapters.len(),
            novel.scenes.len()
        );
        self.tree = Some(root);
        Ok(())
    }

    /// Merge `novel` into the tree of the last read (or a new tree) and write it,
    /// keeping the previous file as `<project>.bak`.
    pub fn write(&mut self, novel: &mut Novel, settings: &ConvertSettings) -> Result<(), ConvertError> {
        if self.is_locked() {
            return Err(ConvertError::ProjectLocked(norm_path(&self.file_path)));
        }

        writer::prepare_novel(novel, settings);
        let root = writer::build_element_tree(self.tree.take(), novel);

        let text = match xml_tree::to_xml_string(&root) {
            Ok(text) => writer::postprocess_xml(&text),
            Err(e) => {
                error(&format!("Cannot serialize {}: {}", norm_path(&self.file_path), e));
                self.tree = Some(root);
                return Err(ConvertError::WriteFailed(norm_path(&self.file_path)));
            }
        };

        let result = writer::write_file_with_backup(&self.file_path, &text, |path, content| fs::write(path, content));
        self.tree = Some(root);
        result?;

        tracing::info!("Wrote {}", norm_path(&self.file_path));
        Ok(())
    }
}
