use std::fs;

mod helpers;
use helpers as h;

use novelsync_backend::app_settings::ConvertSettings;
use novelsync_backend::converter::Converter;
use novelsync_backend::types::{ConvertError, norm_path};
use novelsync_backend::ui::{DefaultUi, Translate};

fn converter() -> Converter<DefaultUi> {
    Converter::new(DefaultUi::new(), ConvertSettings::default())
}

const BODY: &str = r#"<text:h text:outline-level="2">One</text:h><text:p>Some text.</text:p>"#;

#[test]
fn test_source_not_found() {
    let dir = h::temp_dir();
    let source = dir.path().join("novel_manuscript.odt");

    let mut c = converter();
    let result = c.run(&source);
    assert_eq!(result, Err(ConvertError::SourceNotFound(norm_path(&source))));
    assert_eq!(c.ui.errors, vec![format!("File not found: \"{}\".", norm_path(&source))]);
    assert_eq!(c.new_file, None);
}

#[test]
fn test_no_project_to_write() {
    let dir = h::temp_dir();
    let source = dir.path().join("novel_manuscript.odt");
    h::write_odt(&source, BODY);

    let mut c = converter();
    let result = c.run(&source);
    let project_path = dir.path().join("novel.yw7");
    assert_eq!(result, Err(ConvertError::NoProjectToWrite(norm_path(&project_path))));
    assert!(c.ui.info_what.contains("Editable manuscript"), "got: {}", c.ui.info_what);
    assert!(c.ui.questions.is_empty());
}

#[test]
fn test_overwrite_declined() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let source = dir.path().join("novel_manuscript.odt");
    h::write_odt(&source, BODY);

    let mut c = Converter::new(DefaultUi::declining(), ConvertSettings::default());
    let result = c.run(&source);

    assert_eq!(result, Err(ConvertError::OverwriteDeclined));
    assert_eq!(c.ui.errors, vec!["Action canceled by user."]);
    assert_eq!(
        c.ui.questions,
        vec![format!("Overwrite existing file \"{}\"?", norm_path(&project_path))]
    );
    assert_eq!(fs::read_to_string(&project_path).unwrap(), h::PROJECT_XML);
}

#[test]
fn test_locked_project() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    fs::write(dir.path().join("novel.yw7.lock"), "").unwrap();
    let source = dir.path().join("novel_scenes.odt");
    h::write_odt(&source, BODY);

    let result = converter().run(&source);
    assert_eq!(result, Err(ConvertError::ProjectLocked(norm_path(&project_path))));
}

#[test]
fn test_target_exists() {
    let dir = h::temp_dir();
    let source = dir.path().join("draft.odt");
    h::write_odt(&source, BODY);
    h::write_project(dir.path(), "draft");

    let mut c = converter();
    let result = c.run(&source);
    assert_eq!(result, Err(ConvertError::TargetExists(norm_path(&dir.path().join("draft.yw7")))));
    assert!(c.ui.info_what.starts_with("Create a yWriter project file"));
    assert_eq!(fs::read_to_string(dir.path().join("draft.yw7")).unwrap(), h::PROJECT_XML);
}

#[test]
fn test_not_meant_to_be_written_back() {
    let dir = h::temp_dir();
    for name in ["novel_xref.odt", "novel_brf_synopsis.odt"] {
        let source = dir.path().join(name);
        h::write_odt(&source, BODY);
        let result = converter().run(&source);
        assert_eq!(result, Err(ConvertError::NotMeantToBeWrittenBack(norm_path(&source))));
    }
    assert!(!dir.path().join("novel_xref.yw7").exists());
}

#[test]
fn test_unsupported_file_type() {
    let dir = h::temp_dir();
    let source = dir.path().join("notes.txt");
    fs::write(&source, "Some text.").unwrap();

    let result = converter().run(&source);
    assert_eq!(result, Err(ConvertError::UnsupportedFileType(norm_path(&source))));
}

#[test]
fn test_export_not_supported() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");

    let mut c = converter();
    let result = c.run(&project_path);
    assert_eq!(result, Err(ConvertError::ExportNotSupported(norm_path(&project_path))));
    assert_eq!(c.ui.errors.len(), 1);
}

#[test]
fn test_unreadable_document() {
    let dir = h::temp_dir();
    h::write_project(dir.path(), "novel");
    let source = dir.path().join("novel_manuscript.odt");
    fs::write(&source, "not a zip file").unwrap();

    let result = converter().run(&source);
    assert_eq!(result, Err(ConvertError::CannotReadFile(norm_path(&source))));
}

struct Shouting;

impl Translate for Shouting {
    fn tr(&self, msgid: &str) -> String {
        msgid.to_uppercase()
    }
}

#[test]
fn test_messages_are_translated() {
    let dir = h::temp_dir();
    let source = dir.path().join("missing.odt");

    let mut c = converter().with_translator(Box::new(Shouting));
    let _ = c.run(&source);
    assert_eq!(c.ui.errors, vec![format!("FILE NOT FOUND: \"{}\".", norm_path(&source))]);
}
