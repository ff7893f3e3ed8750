//! Conversion runs: pick the reader and writer by file name and drive one of
//! the export, import or create flows.

use std::path::{Path, PathBuf};

use crate::app_settings::ConvertSettings;
use crate::logger::{debug, error, info};
use crate::model::Novel;
use crate::ods::{self, OdsKind, OdsReader};
use crate::odf;
use crate::odt::{self, OdtKind, OdtReader};
use crate::types::{ConvertError, norm_path};
use crate::ui::{NoTranslation, Translate, Ui};
use crate::yw7::{self, Yw7File};

/// Document names that are produced for reading only.
pub const DO_NOT_IMPORT: [&str; 2] = ["_xref", "_brf_synopsis"];

const PROJECT_DESCRIPTION: &str = "yWriter 7 project";

/// What a source file is, by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Project,
    Odt(OdtKind),
    Ods(OdsKind),
}

impl SourceKind {
    /// The project itself, or a document that is written back into a project.
    pub fn from_path(path: &Path) -> Option<SourceKind> {
        let name = path.file_name()?.to_string_lossy();
        if name.ends_with(yw7::EXTENSION) {
            return Some(SourceKind::Project);
        }
        OdtKind::from_file_name(&name)
            .map(SourceKind::Odt)
            .or_else(|| OdsKind::from_file_name(&name).map(SourceKind::Ods))
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            SourceKind::Project => "",
            SourceKind::Odt(kind) => kind.suffix().unwrap_or(""),
            SourceKind::Ods(kind) => kind.suffix(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceKind::Project => yw7::EXTENSION,
            SourceKind::Odt(_) => odt::EXTENSION,
            SourceKind::Ods(_) => ods::EXTENSION,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceKind::Project => PROJECT_DESCRIPTION,
            SourceKind::Odt(kind) => kind.description(),
            SourceKind::Ods(kind) => kind.description(),
        }
    }
}

/// The project a document belongs to: its name without the kind's suffix.
pub fn project_path_for(source: &Path, kind: SourceKind) -> PathBuf {
    let source_str = source.to_string_lossy();
    let ending = format!("{}{}", kind.suffix(), kind.extension());
    let base = source_str.strip_suffix(&ending).unwrap_or(&source_str);
    PathBuf::from(format!("{}{}", base, yw7::EXTENSION))
}

pub struct Converter<U: Ui> {
    pub ui: U,
    pub settings: ConvertSettings,
    translator: Box<dyn Translate>,
    /// Project written by the last successful run.
    pub new_file: Option<PathBuf>,
}

impl<U: Ui> Converter<U> {
    pub fn new(ui: U, settings: ConvertSettings) -> Self {
        Converter {
            ui,
            settings,
            translator: Box::new(NoTranslation),
            new_file: None,
        }
    }

    pub fn with_translator(mut self, translator: Box<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    fn tr(&self, msgid: &str) -> String {
        self.translator.tr(msgid)
    }

    /// Convert `source`. The outcome is reported through the `Ui` as well as
    /// returned.
    pub fn run(&mut self, source: &Path) -> Result<(), ConvertError> {
        self.new_file = None;
        info(&format!("Converting {}", norm_path(source)));

        let result = self.dispatch(source);
        match &result {
            Ok(()) => {
                if let Some(path) = &self.new_file {
                    let message = format!("{}: \"{}\".", self.tr("File written"), norm_path(path));
                    self.ui.set_info_how(&message);
                }
            }
            Err(e) => {
                error(&e.to_string());
                let message = e.localized(self.translator.as_ref());
                self.ui.show_error(&message);
            }
        }
        result
    }

    fn dispatch(&mut self, source: &Path) -> Result<(), ConvertError> {
        if !source.is_file() {
            return Err(ConvertError::SourceNotFound(norm_path(source)));
        }
        let kind = SourceKind::from_path(source);
        debug(&format!("Source kind: {:?}", kind));
        match kind {
            Some(SourceKind::Project) => self.export_from_project(source),
            Some(kind) => self.import_to_project(source, kind),
            None => self.create_project(source),
        }
    }

    fn describe_io(&mut self, source: &Path, description: &str, target: &Path) {
        let message = format!(
            "{}: {} \"{}\"\n{}: {} \"{}\"",
            self.tr("Input"),
            self.tr(description),
            norm_path(source),
            self.tr("Output"),
            self.tr(PROJECT_DESCRIPTION),
            norm_path(target)
        );
        self.ui.set_info_what(&message);
    }

    /// No document export is registered; the project is read to report its
    /// state, then the run ends.
    fn export_from_project(&mut self, source: &Path) -> Result<(), ConvertError> {
        let mut novel = Novel::new();
        Yw7File::new(source).read(&mut novel)?;
        Err(ConvertError::ExportNotSupported(norm_path(source)))
    }

    fn import_to_project(&mut self, source: &Path, kind: SourceKind) -> Result<(), ConvertError> {
        let project_path = project_path_for(source, kind);
        self.describe_io(source, kind.description(), &project_path);

        if !project_path.is_file() {
            return Err(ConvertError::NoProjectToWrite(norm_path(&project_path)));
        }
        let question = format!("{} \"{}\"?", self.tr("Overwrite existing file"), norm_path(&project_path));
        if !self.ui.ask_yes_no(&question) {
            return Err(ConvertError::OverwriteDeclined);
        }

        let mut novel = Novel::new();
        let mut project = Yw7File::new(&project_path);
        project.read(&mut novel)?;

        let scenes_split = match kind {
            SourceKind::Odt(odt_kind) => {
                OdtReader::new(odt_kind, source).read(&mut novel, self.translator.as_ref(), &self.settings)?
            }
            SourceKind::Ods(ods_kind) => {
                OdsReader::new(ods_kind, source).read(&mut novel)?;
                false
            }
            SourceKind::Project => false,
        };

        project.write(&mut novel, &self.settings)?;
        self.new_file = Some(project_path);
        if scenes_split {
            let warning = self.tr("New scenes created during conversion.");
            self.ui.show_warning(&warning);
        }
        Ok(())
    }

    fn create_project(&mut self, source: &Path) -> Result<(), ConvertError> {
        let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        if DO_NOT_IMPORT.iter().any(|suffix| stem.ends_with(suffix)) {
            return Err(ConvertError::NotMeantToBeWrittenBack(norm_path(source)));
        }

        let target = source.with_extension(yw7::EXTENSION.trim_start_matches('.'));
        let message = format!(
            "{}\n{}: \"{}\"",
            self.tr("Create a yWriter project file"),
            self.tr("New project"),
            norm_path(&target)
        );
        self.ui.set_info_what(&message);

        let is_odt = source
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == odt::EXTENSION.trim_start_matches('.'));
        if !is_odt {
            return Err(ConvertError::UnsupportedFileType(norm_path(source)));
        }
        if target.exists() {
            return Err(ConvertError::TargetExists(norm_path(&target)));
        }

        let content = odf::read_part(source, "content.xml")?;
        let kind = if content.contains("Heading_20_3") {
            OdtKind::Outline
        } else {
            OdtKind::WorkInProgress
        };

        let mut novel = Novel::new();
        OdtReader::new(kind, source).read(&mut novel, self.translator.as_ref(), &self.settings)?;
        Yw7File::new(&target).write(&mut novel, &self.settings)?;
        self.new_file = Some(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(SourceKind::from_path(Path::new("/a/novel.yw7")), Some(SourceKind::Project));
        assert_eq!(
            SourceKind::from_path(Path::new("/a/novel_proof.odt")),
            Some(SourceKind::Odt(OdtKind::Proof))
        );
        assert_eq!(
            SourceKind::from_path(Path::new("/a/novel_itemlist.ods")),
            Some(SourceKind::Ods(OdsKind::ItemList))
        );
        assert_eq!(SourceKind::from_path(Path::new("/a/draft.odt")), None);
    }

    #[test]
    fn test_project_path_for() {
        let kind = SourceKind::Odt(OdtKind::Notes);
        assert_eq!(
            project_path_for(Path::new("/a/my_notes_notes.odt"), kind),
            PathBuf::from("/a/my_notes.yw7")
        );
        let kind = SourceKind::Ods(OdsKind::SceneList);
        assert_eq!(
            project_path_for(Path::new("/a/novel_scenelist.ods"), kind),
            PathBuf::from("/a/novel.yw7")
        );
    }
}
