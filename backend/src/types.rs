use std::path::Path;

use thiserror::Error;

use crate::ui::Translate;

/// Failures of a conversion run. Each variant renders as one line for the
/// user, see [`ConvertError::localized`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("File type is not supported: \"{0}\".")]
    UnsupportedFileType(String),

    #[error("Export type is not supported: \"{0}\".")]
    ExportNotSupported(String),

    #[error("This document is not meant to be written back: \"{0}\".")]
    NotMeantToBeWrittenBack(String),

    #[error("File not found: \"{0}\".")]
    SourceNotFound(String),

    #[error("File already exists: \"{0}\".")]
    TargetExists(String),

    #[error("yWriter seems to be open. Please close first: \"{0}\".")]
    ProjectLocked(String),

    #[error("Can not process file: \"{0}\".")]
    MalformedProjectFile(String),

    #[error("Cannot read file: \"{0}\".")]
    CannotReadFile(String),

    #[error("Unexpected document structure in \"{path}\": {detail}.")]
    MalformedDocument { path: String, detail: String },

    #[error("Wrong table structure: \"{0}\".")]
    MalformedTable(String),

    #[error("Action canceled by user.")]
    OverwriteDeclined,

    #[error("Cannot write file: \"{0}\".")]
    WriteFailed(String),

    #[error("No yWriter project to write: \"{0}\".")]
    NoProjectToWrite(String),
}

impl ConvertError {
    pub fn malformed_document(path: &Path, detail: &str) -> Self {
        ConvertError::MalformedDocument {
            path: norm_path(path),
            detail: detail.to_string(),
        }
    }

    /// The user-facing message, with the fixed part passed through the translator.
    pub fn localized(&self, tr: &dyn Translate) -> String {
        let quoted = |msgid: &str, path: &str| format!("{}: \"{}\".", tr.tr(msgid), path);

        match self {
            ConvertError::UnsupportedFileType(p) => quoted("File type is not supported", p),
            ConvertError::ExportNotSupported(p) => quoted("Export type is not supported", p),
            ConvertError::NotMeantToBeWrittenBack(p) => quoted("This document is not meant to be written back", p),
            ConvertError::SourceNotFound(p) => quoted("File not found", p),
            ConvertError::TargetExists(p) => quoted("File already exists", p),
            ConvertError::ProjectLocked(p) => quoted("yWriter seems to be open. Please close first", p),
            ConvertError::MalformedProjectFile(p) => quoted("Can not process file", p),
            ConvertError::CannotReadFile(p) => quoted("Cannot read file", p),
            ConvertError::MalformedDocument { path, detail } => {
                format!("{}: \"{}\" ({}).", tr.tr("Unexpected document structure"), path, detail)
            }
            ConvertError::MalformedTable(p) => quoted("Wrong table structure", p),
            ConvertError::OverwriteDeclined => format!("{}.", tr.tr("Action canceled by user")),
            ConvertError::WriteFailed(p) => quoted("Cannot write file", p),
            ConvertError::NoProjectToWrite(p) => quoted("No yWriter project to write", p),
        }
    }
}

/// Path as shown in messages, with forward slashes on every platform.
pub fn norm_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::NoTranslation;

    #[test]
    fn test_localized_matches_display() {
        let errors = vec![
            ConvertError::SourceNotFound("a/b.odt".to_string()),
            ConvertError::WriteFailed("a/b.yw7".to_string()),
            ConvertError::OverwriteDeclined,
            ConvertError::malformed_document(Path::new("x.odt"), "scene outside of a chapter"),
        ];
        for e in errors {
            let display = e.to_string();
            let localized = e.localized(&NoTranslation);
            if let ConvertError::MalformedDocument { .. } = e {
                assert!(localized.contains("scene outside of a chapter"), "got: {}", localized);
            } else {
                assert_eq!(display, localized);
            }
        }
    }

    #[test]
    fn test_norm_path() {
        assert_eq!(norm_path(Path::new("C:\\novel\\book.yw7")), "C:/novel/book.yw7");
    }
}
