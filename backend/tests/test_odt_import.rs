use std::fs;

mod helpers;
use helpers as h;

use novelsync_backend::app_settings::ConvertSettings;
use novelsync_backend::converter::Converter;
use novelsync_backend::model::{ChapterLevel, Novel, SceneStatus};
use novelsync_backend::odt::{OdtKind, OdtReader};
use novelsync_backend::types::{ConvertError, norm_path};
use novelsync_backend::ui::{DefaultUi, NoTranslation};

const MANUSCRIPT_BODY: &str = r#"<text:section text:name="ChID:1">
<text:h text:style-name="Heading_20_2" text:outline-level="2">Chapter One</text:h>
<text:section text:name="ScID:1">
<text:h text:style-name="Heading_20_3" text:outline-level="3">Boarding</text:h>
<text:p text:style-name="Text_20_body">Ada walked along the <text:span text:style-name="T1">empty</text:span> platform.</text:p>
<text:p text:style-name="Text_20_body">She sang <text:span text:style-name="T2">Grüezi</text:span>.</text:p>
<text:p text:style-name="Text_20_body">### Ticket check|Ada meets Ben</text:p>
<text:p text:style-name="Text_20_body">Ben had no ticket.</text:p>
</text:section>
<text:section text:name="ScID:2">
<text:h text:style-name="Heading_20_3" text:outline-level="3">Departure</text:h>
<text:p text:style-name="Text_20_body">The train left at last.</text:p>
</text:section>
</text:section>"#;

#[test]
fn test_manuscript_import_splits_scenes() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let source = dir.path().join("novel_manuscript.odt");
    h::write_odt(&source, MANUSCRIPT_BODY);

    let mut converter = Converter::new(DefaultUi::new(), ConvertSettings::default());
    converter.run(&source).unwrap();

    assert_eq!(converter.ui.warnings, vec!["New scenes created during conversion."]);
    assert_eq!(converter.ui.info_how, format!("File written: \"{}\".", norm_path(&project_path)));
    assert_eq!(converter.ui.questions.len(), 1);
    assert!(converter.ui.errors.is_empty());

    let novel = h::read_project(&project_path);
    assert_eq!(novel.chapters["1"].srt_scenes, vec!["1", "4", "2"]);

    let boarding = &novel.scenes["1"];
    assert_eq!(
        boarding.scene_content(),
        Some("Ada walked along the [i]empty[/i] platform.\nShe sang [lang=de-CH]Grüezi[/lang=de-CH].")
    );
    assert_eq!(boarding.status, Some(SceneStatus::Draft));
    assert_eq!(boarding.desc.as_deref(), Some("(!)Ada checks tickets."));

    let ticket_check = &novel.scenes["4"];
    assert_eq!(ticket_check.title.as_deref(), Some("Ticket check"));
    assert_eq!(ticket_check.desc.as_deref(), Some("Ada meets Ben"));
    assert_eq!(ticket_check.scene_content(), Some("Ben had no ticket."));
    assert_eq!(ticket_check.status, Some(SceneStatus::Draft));

    assert_eq!(novel.scenes["2"].scene_content(), Some("The train left at last."));
    // Untouched by the manuscript.
    assert_eq!(novel.scenes["3"].scene_content(), Some("Timetables of 1920."));
    assert_eq!(novel.languages, Some(vec!["de-CH".to_string()]));

    let written = fs::read_to_string(&project_path).unwrap();
    assert!(written.contains("<Plotline flavor=\"noir\">Keep me</Plotline>"));
}

#[test]
fn test_proof_import() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let mut novel = h::read_project(&project_path);

    let source = dir.path().join("novel_proof.odt");
    h::write_odt(
        &source,
        r#"<text:p>[ChID:1]</text:p>
<text:h text:outline-level="2">Chapter One</text:h>
<text:p>[ScID:1]</text:p>
<text:p>Ada walked along the <text:span text:style-name="T1">whole</text:span> platform.</text:p>
<text:p>[/ScID]</text:p>
<text:p>[ScID:2]</text:p>
<text:p>The train left.</text:p>
<text:p>[/ScID]</text:p>
<text:p>[/ChID]</text:p>"#,
    );

    let split = OdtReader::new(OdtKind::Proof, &source)
        .read(&mut novel, &NoTranslation, &ConvertSettings::default())
        .unwrap();
    assert!(!split);
    assert_eq!(novel.scenes["1"].scene_content(), Some("Ada walked along the [i]whole[/i] platform."));
    assert_eq!(novel.scenes["2"].scene_content(), Some("The train left."));
    assert_eq!(novel.scenes["1"].status, Some(SceneStatus::FirstEdit));
}

#[test]
fn test_scene_descriptions() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let mut novel = h::read_project(&project_path);

    let source = dir.path().join("novel_scenes.odt");
    h::write_odt(
        &source,
        r#"<text:section text:name="ChID:1">
<text:h text:outline-level="2">Chapter One</text:h>
<text:section text:name="ScID:1"><text:p><office:annotation><dc:creator>Jo</dc:creator><text:p>~ At the gate ~</text:p></office:annotation>Ada checks every ticket.</text:p><text:p>Twice.</text:p></text:section>
<text:section text:name="ScID:2"><text:p>They leave.</text:p></text:section>
</text:section>"#,
    );

    OdtReader::new(OdtKind::SceneDesc, &source)
        .read(&mut novel, &NoTranslation, &ConvertSettings::default())
        .unwrap();

    assert_eq!(novel.scenes["1"].title.as_deref(), Some("At the gate"));
    assert_eq!(novel.scenes["1"].desc.as_deref(), Some("Ada checks every ticket.\nTwice."));
    assert_eq!(novel.scenes["2"].title.as_deref(), Some("Departure"));
    assert_eq!(novel.scenes["2"].desc.as_deref(), Some("They leave."));
    // Text is left alone.
    assert_eq!(novel.scenes["1"].scene_content(), Some("Ada walked along the platform."));
}

#[test]
fn test_scene_outside_of_chapter() {
    let dir = h::temp_dir();
    let source = dir.path().join("novel_scenes.odt");
    h::write_odt(&source, r#"<text:section text:name="ScID:7"><text:p>Lost.</text:p></text:section>"#);

    let mut novel = Novel::new();
    let result = OdtReader::new(OdtKind::SceneDesc, &source).read(&mut novel, &NoTranslation, &ConvertSettings::default());
    assert!(matches!(result, Err(ConvertError::MalformedDocument { .. })));
}

#[test]
fn test_character_and_world_descriptions() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let mut novel = h::read_project(&project_path);

    let characters = dir.path().join("novel_characters.odt");
    h::write_odt(
        &characters,
        r#"<text:h text:outline-level="2">Ada</text:h>
<text:section text:name="CrID_desc:1"><text:p>Head <text:span text:style-name="T1">conductor</text:span>.</text:p><text:p>Strict.</text:p></text:section>
<text:section text:name="CrID_bio:1"><text:p>Born on a train. </text:p></text:section>
<text:h text:outline-level="2">Stowaway</text:h>
<text:section text:name="CrID_desc:5"><text:p>Hides in the mail car.</text:p></text:section>
<text:section text:name="CrID_notes:8"><text:p>Unknown character.</text:p></text:section>"#,
    );
    OdtReader::new(OdtKind::Characters, &characters)
        .read(&mut novel, &NoTranslation, &ConvertSettings::default())
        .unwrap();

    assert_eq!(novel.characters["1"].desc.as_deref(), Some("Head conductor.\nStrict."));
    assert_eq!(novel.characters["1"].bio.as_deref(), Some("Born on a train."));
    assert_eq!(novel.characters["5"].desc.as_deref(), Some("Hides in the mail car."));
    assert!(!novel.characters.contains_key("8"));
    assert_eq!(novel.characters["5"].notes, None);
    assert_eq!(novel.srt_characters, vec!["1", "2", "5"]);

    let items = dir.path().join("novel_items.odt");
    h::write_odt(
        &items,
        r#"<text:section text:name="ItID:1"><text:p>Punched twice.</text:p></text:section>
<text:section text:name="ItID:2"><text:p>A <text:span text:style-name="T2">brass</text:span> key.</text:p></text:section>"#,
    );
    OdtReader::new(OdtKind::Items, &items)
        .read(&mut novel, &NoTranslation, &ConvertSettings::default())
        .unwrap();

    assert_eq!(novel.items["1"].desc.as_deref(), Some("Punched twice."));
    assert_eq!(novel.items["1"].title.as_deref(), Some("Ticket"));
    assert_eq!(novel.items["2"].desc.as_deref(), Some("A brass key."));
    assert_eq!(novel.srt_items, vec!["1", "2"]);
    assert_eq!(novel.locations["1"].desc.as_deref(), Some("Cold and empty."));
}

#[test]
fn test_new_project_from_work_in_progress() {
    let dir = h::temp_dir();
    let source = dir.path().join("draft.odt");
    h::write_odt(
        &source,
        r#"<text:h text:outline-level="1">Part One</text:h>
<text:h text:outline-level="2">The Start</text:h>
<text:p>It was a dark and stormy night, the rain fell in torrents.</text:p>
<text:p>* * *</text:p>
<text:p>Short one.</text:p>
<text:h text:outline-level="2">The End</text:h>
<text:p><office:annotation><text:p>Finale</text:p></office:annotation>Everyone went home, tired but happy, at the end of it all.</text:p>"#,
    );

    let mut converter = Converter::new(DefaultUi::new(), ConvertSettings::default());
    converter.run(&source).unwrap();

    let project_path = dir.path().join("draft.yw7");
    assert_eq!(converter.new_file, Some(project_path.clone()));
    assert!(converter.ui.warnings.is_empty());
    assert!(converter.ui.questions.is_empty());

    let novel = h::read_project(&project_path);
    assert_eq!(novel.title.as_deref(), Some("The Night Train"));
    assert_eq!(novel.author_name.as_deref(), Some("Jo Quill"));
    assert_eq!(novel.language_code.as_deref(), Some("en"));
    assert_eq!(novel.country_code.as_deref(), Some("GB"));

    assert_eq!(novel.srt_chapters, vec!["1", "2", "3"]);
    assert_eq!(novel.chapters["1"].title.as_deref(), Some("Part One"));
    assert_eq!(novel.chapters["1"].ch_level, Some(ChapterLevel::Part));
    assert_eq!(novel.chapters["2"].ch_level, Some(ChapterLevel::Chapter));
    assert_eq!(novel.chapters["2"].srt_scenes, vec!["1", "2"]);
    assert_eq!(novel.chapters["3"].srt_scenes, vec!["3"]);

    assert_eq!(novel.scenes["1"].title.as_deref(), Some("Scene 1"));
    assert_eq!(novel.scenes["1"].status, Some(SceneStatus::Draft));
    assert_eq!(novel.scenes["2"].scene_content(), Some("Short one."));
    assert_eq!(novel.scenes["2"].status, Some(SceneStatus::Outline));
    assert_eq!(novel.scenes["3"].title.as_deref(), Some("Finale"));
    assert_eq!(
        novel.scenes["3"].scene_content(),
        Some("Everyone went home, tired but happy, at the end of it all.")
    );
}

#[test]
fn test_new_project_from_outline() {
    let dir = h::temp_dir();
    let source = dir.path().join("outline.odt");
    h::write_odt(
        &source,
        r#"<text:h text:style-name="Heading_20_2" text:outline-level="2">Arrival</text:h>
<text:p>Everybody arrives.</text:p>
<text:h text:style-name="Heading_20_3" text:outline-level="3">At the gate</text:h>
<text:p>Ada checks tickets.</text:p>
<text:h text:style-name="Heading_20_3" text:outline-level="3">On board</text:h>"#,
    );

    let mut converter = Converter::new(DefaultUi::new(), ConvertSettings::default());
    converter.run(&source).unwrap();

    let novel = h::read_project(&dir.path().join("outline.yw7"));
    assert_eq!(novel.srt_chapters, vec!["1"]);
    let chapter = &novel.chapters["1"];
    assert_eq!(chapter.title.as_deref(), Some("Arrival"));
    assert_eq!(chapter.desc.as_deref(), Some("Everybody arrives."));
    assert_eq!(chapter.srt_scenes, vec!["1", "2"]);

    assert_eq!(novel.scenes["1"].title.as_deref(), Some("At the gate"));
    assert_eq!(novel.scenes["1"].desc.as_deref(), Some("Ada checks tickets."));
    assert_eq!(novel.scenes["1"].status, Some(SceneStatus::Outline));
    assert_eq!(novel.scenes["2"].title.as_deref(), Some("On board"));
    assert_eq!(novel.scenes["2"].desc, None);
}

#[test]
fn test_outline_scene_before_chapter() {
    let dir = h::temp_dir();
    let source = dir.path().join("outline.odt");
    h::write_odt(
        &source,
        r#"<text:h text:style-name="Heading_20_3" text:outline-level="3">Too early</text:h>"#,
    );

    let mut converter = Converter::new(DefaultUi::new(), ConvertSettings::default());
    let result = converter.run(&source);
    assert!(matches!(result, Err(ConvertError::MalformedDocument { .. })));
    assert_eq!(converter.ui.errors.len(), 1);
    assert!(!dir.path().join("outline.yw7").exists());
}

#[test]
fn test_chapter_descriptions() {
    let dir = h::temp_dir();
    let project_path = h::write_project(dir.path(), "novel");
    let mut novel = h::read_project(&project_path);

    let source = dir.path().join("novel_chapters.odt");
    h::write_odt(
        &source,
        r#"<text:section text:name="ChID:1"><text:h text:outline-level="2">Renamed</text:h><text:p>They <text:span text:style-name="T1">board</text:span>.</text:p><text:p>Night falls.</text:p></text:section>
<text:section text:name="ChID:3"><text:h text:outline-level="2">Epilogue</text:h><text:p>The end.</text:p></text:section>"#,
    );
    OdtReader::new(OdtKind::ChapterDesc, &source)
        .read(&mut novel, &NoTranslation, &ConvertSettings::default())
        .unwrap();

    // An existing title is kept.
    assert_eq!(novel.chapters["1"].title.as_deref(), Some("Chapter One"));
    assert_eq!(novel.chapters["1"].desc.as_deref(), Some("They board.\nNight falls."));
    assert_eq!(novel.chapters["3"].title.as_deref(), Some("Epilogue"));
    assert_eq!(novel.chapters["3"].desc.as_deref(), Some("The end."));
    assert_eq!(novel.srt_chapters, vec!["1", "2", "3"]);
}
