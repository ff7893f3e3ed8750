use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::app_settings::ConvertSettings;
use crate::helpers::{create_id, list_to_string};
use crate::logger::{error, warn};
use crate::model::{Chapter, ChapterLevel, Character, ElementType, KwVar, Novel, Scene, WorldElement, BasicElement};
use crate::types::{ConvertError, norm_path};
use crate::xml_tree::XmlElement;

use super::{append_to_path, CDATA_TAGS, PRJ_KWVAR, SCN_KWVAR};

lazy_static! {
    static ref RE_CDATA_FIELD: Regex = {
        let tags = CDATA_TAGS.join("|");
        Regex::new(&format!(r"(?s)<({tags})>(.*?)</({tags})>")).unwrap()
    };
}

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Model changes that go along with writing a project file.
pub(super) fn prepare_novel(novel: &mut Novel, settings: &ConvertSettings) {
    if novel.languages.is_none() {
        novel.get_languages();
    }

    for scene in novel.scenes.values_mut() {
        if let Some(arcs) = &scene.scn_arcs {
            scene.kw_var.insert("Field_SceneArcs".to_string(), Some(arcs.clone()));
        }
        if let Some(style) = &scene.scn_style {
            scene.kw_var.insert("Field_SceneStyle".to_string(), Some(style.clone()));
        }
    }

    // The locale moves from project fields to project variables.
    for name in PRJ_KWVAR {
        novel.kw_var.insert(name.to_string(), None);
    }

    let has_languages = novel.languages.as_ref().is_some_and(|l| !l.is_empty());
    if has_languages || novel.language_code.is_some() || novel.country_code.is_some() {
        novel.check_locale(&settings.fallback_language_code, &settings.fallback_country_code);
    }
}

/// Set the text of `tag`, inserting it at `index` if missing. Returns the index
/// after the element, or `index` if there was nothing to set.
fn set_element(parent: &mut XmlElement, tag: &str, text: Option<&str>, index: usize) -> usize {
    let Some(text) = text else { return index };
    let (element, _) = parent.child_or_insert(tag, index);
    element.set_text(text);
    index + 1
}

fn set_or_append(parent: &mut XmlElement, tag: &str, text: &str) {
    let (element, _) = parent.child_or_append(tag);
    element.set_text(text);
}

/// An existing element is always updated, a missing one only created for non-empty text.
fn update_text(parent: &mut XmlElement, tag: &str, text: Option<&str>) {
    let Some(text) = text else { return };
    match parent.find_mut(tag) {
        Some(element) => element.set_text(text),
        None => {
            if !text.is_empty() {
                parent.push(XmlElement::with_text(tag, text));
            }
        }
    }
}

fn set_flag(parent: &mut XmlElement, tag: &str, on: bool) {
    if on {
        if !parent.has_child(tag) {
            parent.push(XmlElement::with_text(tag, "-1"));
        }
    } else {
        parent.remove(tag);
    }
}

fn remove_field(parent: &mut XmlElement, name: &str) {
    if let Some(fields) = parent.find_mut("Fields") {
        fields.remove(name);
    }
}

fn set_field(parent: &mut XmlElement, name: &str, value: &str) {
    let (fields, _) = parent.child_or_append("Fields");
    set_or_append(fields, name, value);
}

fn update_kw_fields(parent: &mut XmlElement, names: &[&str], kw_var: &KwVar) {
    for name in names {
        match kw_var.get(*name).and_then(|v| v.as_deref()).filter(|v| !v.is_empty()) {
            Some(value) => set_field(parent, name, value),
            None => remove_field(parent, name),
        }
    }
}

fn build_project_subtree(prj: &mut XmlElement, novel: &Novel) {
    set_or_append(prj, "Ver", "7");

    let texts = [
        ("Title", &novel.title),
        ("Desc", &novel.desc),
        ("AuthorName", &novel.author_name),
        ("Bio", &novel.author_bio),
        ("FieldTitle1", &novel.field_title1),
        ("FieldTitle2", &novel.field_title2),
        ("FieldTitle3", &novel.field_title3),
        ("FieldTitle4", &novel.field_title4),
    ];
    for (tag, value) in texts {
        if let Some(text) = value {
            set_or_append(prj, tag, text);
        }
    }

    if let Some(n) = novel.word_count_start {
        set_or_append(prj, "WordCountStart", &n.to_string());
    }
    if let Some(n) = novel.word_target {
        set_or_append(prj, "WordTarget", &n.to_string());
    }

    update_kw_fields(prj, &PRJ_KWVAR, &novel.kw_var);
}

fn push_optional(parent: &mut XmlElement, tag: &str, text: &Option<String>) {
    if let Some(text) = text {
        parent.push(XmlElement::with_text(tag, text));
    }
}

fn push_tags(parent: &mut XmlElement, tags: &Option<Vec<String>>) {
    if let Some(tags) = tags {
        parent.push(XmlElement::with_text("Tags", &list_to_string(tags, ";")));
    }
}

fn build_world_element(tag: &str, id: &str, element: &WorldElement, sort_order: usize) -> XmlElement {
    let mut xml = XmlElement::new(tag);
    xml.push(XmlElement::with_text("ID", id));
    push_optional(&mut xml, "Title", &element.title);
    push_optional(&mut xml, "ImageFile", &element.image);
    push_optional(&mut xml, "Desc", &element.desc);
    push_optional(&mut xml, "AKA", &element.aka);
    push_tags(&mut xml, &element.tags);
    xml.push(XmlElement::with_text("SortOrder", &sort_order.to_string()));
    xml
}

fn build_character(id: &str, character: &Character, sort_order: usize) -> XmlElement {
    let mut xml = XmlElement::new("CHARACTER");
    xml.push(XmlElement::with_text("ID", id));
    push_optional(&mut xml, "Title", &character.title);
    push_optional(&mut xml, "Desc", &character.desc);
    push_optional(&mut xml, "ImageFile", &character.image);
    xml.push(XmlElement::with_text("SortOrder", &sort_order.to_string()));
    push_optional(&mut xml, "Notes", &character.notes);
    push_optional(&mut xml, "AKA", &character.aka);
    push_tags(&mut xml, &character.tags);
    push_optional(&mut xml, "Bio", &character.bio);
    push_optional(&mut xml, "Goals", &character.goals);
    push_optional(&mut xml, "FullName", &character.full_name);
    if character.is_major == Some(true) {
        xml.push(XmlElement::with_text("Major", "-1"));
    }
    xml
}

fn build_project_note(id: &str, note: &BasicElement, sort_order: usize) -> XmlElement {
    let mut xml = XmlElement::new("PROJECTNOTE");
    xml.push(XmlElement::with_text("ID", id));
    push_optional(&mut xml, "Title", &note.title);
    push_optional(&mut xml, "Desc", &note.desc);
    xml.push(XmlElement::with_text("SortOrder", &sort_order.to_string()));
    xml
}

fn rebuild_world_section<'a>(
    section: &mut XmlElement,
    tag: &str,
    order: &'a [String],
    lookup: impl Fn(&str) -> Option<&'a WorldElement>,
) {
    section.remove_all(tag);
    let mut sort_order = 0;
    for id in order {
        match lookup(id) {
            Some(element) => {
                sort_order += 1;
                section.push(build_world_element(tag, id, element, sort_order));
            }
            None => warn(&format!("{} {} is listed but unknown", tag, id)),
        }
    }
}

fn section_mut<'a>(root: &'a mut XmlElement, name: &str) -> &'a mut XmlElement {
    root.child_or_append(name).0
}

fn element_id(element: &XmlElement) -> String {
    element.child_text("ID").map(|t| t.trim().to_string()).unwrap_or_default()
}

fn build_projectvars(root: &mut XmlElement, novel: &Novel) {
    let has_languages = novel.languages.as_ref().is_some_and(|l| !l.is_empty());
    if !has_languages && novel.language_code.is_none() && novel.country_code.is_none() {
        return;
    }

    let language_code = novel.language_code.clone().unwrap_or_default();
    let country_code = novel.country_code.clone().unwrap_or_default();
    let projectvars = section_mut(root, "PROJECTVARS");

    let mut var_ids: Vec<String> = Vec::new();
    let mut languages: Vec<String> = novel.languages.clone().unwrap_or_default();
    let mut has_language_code = false;
    let mut has_country_code = false;

    for var in projectvars.children.iter_mut().filter(|c| c.name == "PROJECTVAR") {
        var_ids.push(element_id(var));
        let title = var.child_text("Title").unwrap_or("").to_string();
        if let Some(code) = title.strip_prefix("lang=") {
            languages.retain(|l| l != code);
        } else if title == "Language" {
            set_or_append(var, "Desc", &language_code);
            has_language_code = true;
        } else if title == "Country" {
            set_or_append(var, "Desc", &country_code);
            has_country_code = true;
        }
    }

    let mut add_projectvar = |projectvars: &mut XmlElement, title: &str, desc: &str| {
        let id = create_id(&var_ids);
        var_ids.push(id.clone());
        let var = projectvars.push(XmlElement::new("PROJECTVAR"));
        var.push(XmlElement::with_text("ID", &id));
        var.push(XmlElement::with_text("Title", title));
        var.push(XmlElement::with_text("Desc", desc));
        var.push(XmlElement::with_text("Tags", "0"));
    };

    if !has_language_code {
        add_projectvar(projectvars, "Language", &language_code);
    }
    if !has_country_code {
        add_projectvar(projectvars, "Country", &country_code);
    }
    for code in &languages {
        add_projectvar(projectvars, &format!("lang={}", code), &format!("<HTM <SPAN LANG=\"{}\"> /HTM>", code));
        add_projectvar(projectvars, &format!("/lang={}", code), "<HTM </SPAN> /HTM>");
    }
}

fn remove_date_time(xml: &mut XmlElement) {
    for tag in ["SpecificDateTime", "SpecificDateMode", "Day", "Hour", "Minute"] {
        xml.remove(tag);
    }
}

fn build_scene_date(xml: &mut XmlElement, sc_id: &str, scene: &Scene) {
    if let (Some(date), Some(time)) = (&scene.date, &scene.time) {
        let mut date_time = format!("{} {}", date, time);
        if date_time == " " {
            remove_date_time(xml);
        } else if let Some(element) = xml.find_mut("SpecificDateTime") {
            if date_time.matches(':').count() < 2 {
                date_time.push_str(":00");
            }
            element.set_text(&date_time);
        } else {
            xml.push(XmlElement::with_text("SpecificDateTime", &date_time));
            xml.push(XmlElement::with_text("SpecificDateMode", "-1"));
            for tag in ["Day", "Hour", "Minute"] {
                xml.remove(tag);
            }
        }
    } else if scene.day.is_some() || scene.time.is_some() {
        let day = scene.day.as_deref().unwrap_or("");
        let time = scene.time.as_deref().unwrap_or("");
        if day.is_empty() && time.is_empty() {
            remove_date_time(xml);
            return;
        }

        xml.remove("SpecificDateTime");
        xml.remove("SpecificDateMode");
        if let Some(day) = &scene.day {
            set_or_append(xml, "Day", day);
        }
        if let Some(time) = &scene.time {
            let parts: Vec<&str> = time.split(':').collect();
            if parts.len() >= 2 {
                set_or_append(xml, "Hour", parts[0]);
                set_or_append(xml, "Minute", parts[1]);
            } else {
                warn(&format!("Scene {}: malformed time {:?} not written", sc_id, time));
            }
        }
    }
}

fn replace_id_list(xml: &mut XmlElement, container: &str, tag: &str, ids: &Option<Vec<String>>) {
    let Some(ids) = ids else { return };
    let (list, _) = xml.child_or_append(container);
    list.remove_all(tag);
    for id in ids {
        list.push(XmlElement::with_text(tag, id));
    }
}

fn build_scene_subtree(xml: &mut XmlElement, sc_id: &str, scene: &Scene, novel: &Novel) {
    set_element(xml, "Title", scene.title.as_deref(), 1);

    if !xml.has_child("BelongsToChID") {
        if let Some(ch_id) = novel.chapter_of_scene(sc_id) {
            xml.push(XmlElement::with_text("BelongsToChID", ch_id));
        }
    }

    update_text(xml, "Desc", scene.desc.as_deref());

    if !xml.has_child("SceneContent") {
        let mut content = XmlElement::new("SceneContent");
        content.text = scene.scene_content().map(|t| t.to_string());
        xml.push(content);
    }
    if !xml.has_child("WordCount") {
        xml.push(XmlElement::with_text("WordCount", &scene.word_count().to_string()));
    }
    if !xml.has_child("LetterCount") {
        xml.push(XmlElement::with_text("LetterCount", &scene.letter_count().to_string()));
    }

    let (unused, scene_type) = match scene.sc_type.unwrap_or_default() {
        ElementType::Normal => (false, None),
        ElementType::Notes => (true, Some("1")),
        ElementType::Todo => (true, Some("2")),
        ElementType::Unused => (true, Some("0")),
    };
    set_flag(xml, "Unused", unused);
    match scene_type {
        Some(t) => set_field(xml, "Field_SceneType", t),
        None => remove_field(xml, "Field_SceneType"),
    }

    update_kw_fields(xml, &SCN_KWVAR, &scene.kw_var);

    if let Some(status) = scene.status {
        set_or_append(xml, "Status", &status.index().to_string());
    }

    update_text(xml, "Notes", scene.notes.as_deref());
    if let Some(tags) = &scene.tags {
        update_text(xml, "Tags", Some(&list_to_string(tags, ";")));
    }
    update_text(xml, "Field1", scene.field1.as_deref());
    update_text(xml, "Field2", scene.field2.as_deref());
    update_text(xml, "Field3", scene.field3.as_deref());
    update_text(xml, "Field4", scene.field4.as_deref());

    set_flag(xml, "AppendToPrev", scene.append_to_prev == Some(true));

    build_scene_date(xml, sc_id, scene);

    update_text(xml, "LastsDays", scene.lasts_days.as_deref());
    update_text(xml, "LastsHours", scene.lasts_hours.as_deref());
    update_text(xml, "LastsMinutes", scene.lasts_minutes.as_deref());

    set_flag(xml, "ReactionScene", scene.is_reaction_scene == Some(true));
    set_flag(xml, "SubPlot", scene.is_sub_plot == Some(true));

    update_text(xml, "Goal", scene.goal.as_deref());
    update_text(xml, "Conflict", scene.conflict.as_deref());
    update_text(xml, "Outcome", scene.outcome.as_deref());
    update_text(xml, "ImageFile", scene.image.as_deref());

    replace_id_list(xml, "Characters", "CharID", &scene.characters);
    replace_id_list(xml, "Locations", "LocID", &scene.locations);
    replace_id_list(xml, "Items", "ItemID", &scene.items);

    if let Some(content) = scene.scene_content() {
        set_or_append(xml, "SceneContent", content);
        set_or_append(xml, "WordCount", &scene.word_count().to_string());
        set_or_append(xml, "LetterCount", &scene.letter_count().to_string());
    }
    xml.remove("RTFFile");
}

/// Chapter flag in `Fields`. When off, an existing field is reset to "0", or
/// removed if `remove_when_off`.
fn set_chapter_field(fields: &mut XmlElement, name: &str, on: bool, remove_when_off: bool) {
    if on {
        set_or_append(fields, name, "1");
    } else if remove_when_off {
        fields.remove(name);
    } else if let Some(field) = fields.find_mut(name) {
        field.set_text("0");
    }
}

fn build_chapter_subtree(xml: &mut XmlElement, chapter: &Chapter, sort_order: usize) {
    let (unused, ch_type_old, ch_type_new) = match chapter.ch_type.unwrap_or_default() {
        ElementType::Normal => (false, "0", "0"),
        ElementType::Notes => (true, "1", "1"),
        ElementType::Todo => (true, "1", "2"),
        ElementType::Unused => (true, "1", "0"),
    };

    let mut i = 1;
    i = set_element(xml, "Title", chapter.title.as_deref(), i);
    i = set_element(xml, "Desc", chapter.desc.as_deref(), i);

    if unused {
        if !xml.has_child("Unused") {
            xml.insert(i, XmlElement::with_text("Unused", "-1"));
        }
    } else {
        xml.remove("Unused");
    }
    if xml.has_child("Unused") {
        i += 1;
    }

    i = set_element(xml, "SortOrder", Some(&sort_order.to_string()), i);

    let suppress_title = chapter.suppress_chapter_title == Some(true);
    let suppress_break = chapter.suppress_chapter_break == Some(true);
    let is_trash = chapter.is_trash == Some(true);
    if (suppress_title || suppress_break || is_trash) && !xml.has_child("Fields") {
        xml.insert(i, XmlElement::new("Fields"));
    }
    if let Some(fields) = xml.find_mut("Fields") {
        set_chapter_field(fields, "Field_SuppressChapterTitle", suppress_title, false);
        set_chapter_field(fields, "Field_SuppressChapterBreak", suppress_break, false);
        set_chapter_field(fields, "Field_IsTrash", is_trash, true);
        i += 1;
    }

    match (xml.has_child("SectionStart"), chapter.ch_level) {
        (true, Some(ChapterLevel::Chapter)) => {
            xml.remove("SectionStart");
        }
        (false, Some(ChapterLevel::Part)) => xml.insert(i, XmlElement::with_text("SectionStart", "-1")),
        _ => {}
    }
    if xml.has_child("SectionStart") {
        i += 1;
    }

    i = set_element(xml, "Type", Some(ch_type_old), i);
    i = set_element(xml, "ChapterType", Some(ch_type_new), i);

    xml.remove("Scenes");
    if !chapter.srt_scenes.is_empty() {
        let mut scenes = XmlElement::new("Scenes");
        for sc_id in &chapter.srt_scenes {
            scenes.push(XmlElement::with_text("ScID", sc_id));
        }
        xml.insert(i, scenes);
    }
}

fn new_root() -> XmlElement {
    let mut root = XmlElement::new("YWRITER7");
    for section in ["PROJECT", "LOCATIONS", "ITEMS", "CHARACTERS", "PROJECTNOTES", "SCENES", "CHAPTERS"] {
        root.push(XmlElement::new(section));
    }
    root
}

/// Merge the model into the previously read tree, or into a new one.
pub(super) fn build_element_tree(tree: Option<XmlElement>, novel: &Novel) -> XmlElement {
    let mut root = tree.unwrap_or_else(new_root);

    build_project_subtree(section_mut(&mut root, "PROJECT"), novel);

    rebuild_world_section(section_mut(&mut root, "LOCATIONS"), "LOCATION", &novel.srt_locations, |id| {
        novel.locations.get(id)
    });
    rebuild_world_section(section_mut(&mut root, "ITEMS"), "ITEM", &novel.srt_items, |id| novel.items.get(id));

    let characters = section_mut(&mut root, "CHARACTERS");
    characters.remove_all("CHARACTER");
    let mut sort_order = 0;
    for cr_id in &novel.srt_characters {
        if let Some(character) = novel.characters.get(cr_id) {
            sort_order += 1;
            characters.push(build_character(cr_id, character, sort_order));
        }
    }

    if novel.srt_prj_notes.is_empty() {
        root.remove_all("PROJECTNOTES");
    } else {
        let notes = section_mut(&mut root, "PROJECTNOTES");
        notes.remove_all("PROJECTNOTE");
        let mut sort_order = 0;
        for pn_id in &novel.srt_prj_notes {
            if let Some(note) = novel.project_notes.get(pn_id) {
                sort_order += 1;
                notes.push(build_project_note(pn_id, note, sort_order));
            }
        }
    }

    build_projectvars(&mut root, novel);

    let scenes = section_mut(&mut root, "SCENES");
    let mut xml_scenes: Vec<XmlElement> = scenes.remove_all("SCENE");
    for (sc_id, scene) in &novel.scenes {
        let mut xml = match xml_scenes.iter().position(|x| element_id(x) == *sc_id) {
            Some(index) => xml_scenes.swap_remove(index),
            None => {
                let mut xml = XmlElement::new("SCENE");
                xml.push(XmlElement::with_text("ID", sc_id));
                xml
            }
        };
        build_scene_subtree(&mut xml, sc_id, scene, novel);
        scenes.push(xml);
    }

    let chapters = section_mut(&mut root, "CHAPTERS");
    let mut xml_chapters: Vec<XmlElement> = chapters.remove_all("CHAPTER");
    let mut sort_order = 0;
    for ch_id in &novel.srt_chapters {
        let Some(chapter) = novel.chapters.get(ch_id) else {
            warn(&format!("Chapter {} is listed but unknown", ch_id));
            continue;
        };
        sort_order += 1;
        let mut xml = match xml_chapters.iter().position(|x| element_id(x) == *ch_id) {
            Some(index) => xml_chapters.swap_remove(index),
            None => {
                let mut xml = XmlElement::new("CHAPTER");
                xml.push(XmlElement::with_text("ID", ch_id));
                xml
            }
        };
        build_chapter_subtree(&mut xml, chapter, sort_order);
        chapters.push(xml);
    }

    root
}

/// Put the declaration on top and turn the raw-text fields into CDATA.
pub(super) fn postprocess_xml(text: &str) -> String {
    let body = RE_CDATA_FIELD.replace_all(text, |caps: &Captures| {
        let (start, inner, end) = (&caps[1], &caps[2], &caps[3]);
        let decoded = decode_html_entities(inner);
        if start != end || decoded.contains("]]>") {
            caps[0].to_string()
        } else {
            format!("<{start}><![CDATA[{decoded}]]></{start}>")
        }
    });
    format!("{}\n{}\n", XML_HEADER, body.trim_end())
}

pub(super) fn backup_path(path: &Path) -> PathBuf {
    append_to_path(path, ".bak")
}

/// Replace `path` by `content`, keeping the previous version as `<path>.bak`.
/// If writing fails, the previous version is restored.
pub(super) fn write_file_with_backup<F>(path: &Path, content: &str, write_fn: F) -> Result<(), ConvertError>
where
    F: FnOnce(&Path, &str) -> io::Result<()>,
{
    let backup = backup_path(path);
    let mut backed_up = false;

    if path.is_file() {
        if let Err(e) = fs::rename(path, &backup) {
            error(&format!("Cannot overwrite {}: {}", norm_path(path), e));
            return Err(ConvertError::WriteFailed(norm_path(path)));
        }
        backed_up = true;
    }

    if let Err(e) = write_fn(path, content) {
        error(&format!("Cannot write {}: {}", norm_path(path), e));
        if backed_up {
            if let Err(e) = fs::rename(&backup, path) {
                error(&format!("Cannot restore {}: {}", norm_path(path), e));
            }
        }
        return Err(ConvertError::WriteFailed(norm_path(path)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_tree::to_xml_string;

    #[test]
    fn test_postprocess_wraps_raw_text_fields() {
        let mut root = XmlElement::new("YWRITER7");
        let prj = root.push(XmlElement::new("PROJECT"));
        prj.push(XmlElement::with_text("Title", "Tom & Jerry <3"));
        prj.push(XmlElement::with_text("Ver", "7"));
        prj.push(XmlElement::with_text("Desc", "a ]]> b"));

        let text = postprocess_xml(&to_xml_string(&root).unwrap());
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<YWRITER7>"), "got: {}", text);
        assert!(text.contains("<Title><![CDATA[Tom & Jerry <3]]></Title>"), "got: {}", text);
        assert!(text.contains("<Ver>7</Ver>"));
        assert!(text.contains("<Desc>a ]]&gt; b</Desc>"), "got: {}", text);
    }

    #[test]
    fn test_set_element_index() {
        let mut xml = XmlElement::new("CHAPTER");
        xml.push(XmlElement::with_text("ID", "1"));
        xml.push(XmlElement::with_text("SortOrder", "1"));

        let i = set_element(&mut xml, "Title", Some("One"), 1);
        assert_eq!(i, 2);
        assert_eq!(xml.children[1].name, "Title");

        let i = set_element(&mut xml, "Desc", None, i);
        assert_eq!(i, 2);
        assert!(!xml.has_child("Desc"));
    }

    #[test]
    fn test_backup_rollback_on_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novel.yw7");
        fs::write(&path, "original").unwrap();

        let result = write_file_with_backup(&path, "new", |p, _| {
            fs::write(p, "partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        });

        assert_eq!(result, Err(ConvertError::WriteFailed(norm_path(&path))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_backup_kept_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novel.yw7");
        fs::write(&path, "original").unwrap();

        write_file_with_backup(&path, "new", |p, c| fs::write(p, c)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "original");
    }

    #[test]
    fn test_chapter_type_and_level_encoding() {
        let chapter = Chapter {
            title: Some("Part one".to_string()),
            ch_level: Some(ChapterLevel::Part),
            ch_type: Some(ElementType::Todo),
            is_trash: Some(false),
            srt_scenes: vec!["3".to_string()],
            ..Chapter::default()
        };
        let mut xml = XmlElement::new("CHAPTER");
        xml.push(XmlElement::with_text("ID", "1"));
        build_chapter_subtree(&mut xml, &chapter, 1);

        let names: Vec<&str> = xml.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Title", "Unused", "SortOrder", "SectionStart", "Type", "ChapterType", "Scenes"]);
        assert_eq!(xml.child_text("Type"), Some("1"));
        assert_eq!(xml.child_text("ChapterType"), Some("2"));
    }
}
