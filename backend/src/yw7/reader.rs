use chrono::{NaiveDate, NaiveDateTime};

use crate::helpers::string_to_list;
use crate::logger::warn;
use crate::model::{
    BasicElement, Chapter, ChapterLevel, Character, ElementType, KwVar, Novel, Scene, SceneStatus,
    WorldElement,
};
use crate::xml_tree::XmlElement;

use super::{PRJ_KWVAR, SCN_KWVAR};

fn opt_text(element: &XmlElement, tag: &str) -> Option<String> {
    element.child_text(tag).map(|t| t.to_string())
}

fn opt_tags(element: &XmlElement) -> Option<Vec<String>> {
    element.child_text("Tags").map(|t| string_to_list(t, ";"))
}

fn element_id(element: &XmlElement) -> Option<String> {
    match element.child_text("ID") {
        Some(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        _ => {
            warn(&format!("{} without ID skipped", element.name));
            None
        }
    }
}

/// Declared extension fields, filled from the first matching child of any `Fields`.
fn read_kw_var(element: &XmlElement, names: &[&str]) -> KwVar {
    let mut kw_var = KwVar::new();
    for name in names {
        kw_var.insert(name.to_string(), None);
    }
    for fields in element.find_all("Fields") {
        for name in names {
            if let Some(field) = fields.find(name) {
                kw_var.insert(name.to_string(), field.text.clone());
            }
        }
    }
    kw_var
}

fn field_value<'a>(element: &'a XmlElement, name: &str) -> Option<&'a str> {
    element
        .find_all("Fields")
        .find_map(|fields| fields.find(name))
        .and_then(|f| f.text.as_deref())
}

fn parse_count(text: Option<&str>, what: &str) -> i64 {
    match text.map(|t| t.trim().parse::<i64>()) {
        Some(Ok(n)) => n,
        _ => {
            warn(&format!("{}: not a number ({:?}), using 0", what, text));
            0
        }
    }
}

pub(super) fn read_project(root: &XmlElement, novel: &mut Novel) -> bool {
    let prj = match root.find("PROJECT") {
        Some(p) => p,
        None => return false,
    };

    novel.title = opt_text(prj, "Title");
    novel.author_name = opt_text(prj, "AuthorName");
    novel.author_bio = opt_text(prj, "Bio");
    novel.desc = opt_text(prj, "Desc");
    novel.field_title1 = opt_text(prj, "FieldTitle1");
    novel.field_title2 = opt_text(prj, "FieldTitle2");
    novel.field_title3 = opt_text(prj, "FieldTitle3");
    novel.field_title4 = opt_text(prj, "FieldTitle4");

    if prj.has_child("WordCountStart") {
        novel.word_count_start = Some(parse_count(prj.child_text("WordCountStart"), "WordCountStart"));
    }
    if prj.has_child("WordTarget") {
        novel.word_target = Some(parse_count(prj.child_text("WordTarget"), "WordTarget"));
    }

    novel.kw_var = read_kw_var(prj, &PRJ_KWVAR);
    if let Some(Some(code)) = novel.kw_var.get("Field_LanguageCode") {
        if !code.is_empty() {
            novel.language_code = Some(code.clone());
        }
    }
    if let Some(Some(code)) = novel.kw_var.get("Field_CountryCode") {
        if !code.is_empty() {
            novel.country_code = Some(code.clone());
        }
    }
    true
}

fn read_world_element(element: &XmlElement) -> WorldElement {
    WorldElement {
        title: opt_text(element, "Title"),
        desc: opt_text(element, "Desc"),
        kw_var: KwVar::new(),
        image: opt_text(element, "ImageFile"),
        tags: opt_tags(element),
        aka: opt_text(element, "AKA"),
    }
}

pub(super) fn read_locations(root: &XmlElement, novel: &mut Novel) {
    novel.srt_locations.clear();
    for loc in root.descendants("LOCATION") {
        if let Some(id) = element_id(loc) {
            novel.srt_locations.push(id.clone());
            novel.locations.insert(id, read_world_element(loc));
        }
    }
}

pub(super) fn read_items(root: &XmlElement, novel: &mut Novel) {
    novel.srt_items.clear();
    for itm in root.descendants("ITEM") {
        if let Some(id) = element_id(itm) {
            novel.srt_items.push(id.clone());
            novel.items.insert(id, read_world_element(itm));
        }
    }
}

pub(super) fn read_characters(root: &XmlElement, novel: &mut Novel) {
    novel.srt_characters.clear();
    for crt in root.descendants("CHARACTER") {
        let Some(id) = element_id(crt) else { continue };
        let character = Character {
            title: opt_text(crt, "Title"),
            desc: opt_text(crt, "Desc"),
            kw_var: KwVar::new(),
            image: opt_text(crt, "ImageFile"),
            tags: opt_tags(crt),
            aka: opt_text(crt, "AKA"),
            notes: opt_text(crt, "Notes"),
            bio: opt_text(crt, "Bio"),
            goals: opt_text(crt, "Goals"),
            full_name: opt_text(crt, "FullName"),
            is_major: Some(crt.has_child("Major")),
        };
        novel.srt_characters.push(id.clone());
        novel.characters.insert(id, character);
    }
}

pub(super) fn read_projectvars(root: &XmlElement, novel: &mut Novel) {
    let Some(vars) = root.find("PROJECTVARS") else { return };
    for var in vars.find_all("PROJECTVAR") {
        let Some(title) = var.child_text("Title") else { continue };
        match title {
            "Language" => {
                if let Some(desc) = var.child_text("Desc") {
                    novel.language_code = Some(desc.to_string());
                }
            }
            "Country" => {
                if let Some(desc) = var.child_text("Desc") {
                    novel.country_code = Some(desc.to_string());
                }
            }
            _ if title.starts_with("lang=") => {
                let parts: Vec<&str> = title.split('=').collect();
                if parts.len() == 2 {
                    novel.add_language(parts[1]);
                }
            }
            _ => {}
        }
    }
}

pub(super) fn read_projectnotes(root: &XmlElement, novel: &mut Novel) {
    novel.srt_prj_notes.clear();
    for note in root.descendants("PROJECTNOTE") {
        let Some(id) = element_id(note) else { continue };
        let element = BasicElement {
            title: opt_text(note, "Title"),
            desc: opt_text(note, "Desc"),
            kw_var: KwVar::new(),
        };
        novel.srt_prj_notes.push(id.clone());
        novel.project_notes.insert(id, element);
    }
}

/// Date and time from a `SpecificDateTime` value, or empty strings if malformed.
pub(super) fn parse_specific_date_time(text: &str) -> (String, String) {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return (dt.format("%Y-%m-%d").to_string(), dt.format("%H:%M:%S").to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return (date.format("%Y-%m-%d").to_string(), "00:00:00".to_string());
    }
    warn(&format!("Malformed date/time: {:?}", text));
    (String::new(), String::new())
}

fn zero_padded(text: Option<&str>) -> String {
    format!("{:0>2}", text.unwrap_or("").trim())
}

fn read_scene_date(scn: &XmlElement, scene: &mut Scene) {
    if let Some(date_time) = scn.find("SpecificDateTime") {
        let (date, time) = parse_specific_date_time(date_time.text.as_deref().unwrap_or(""));
        scene.date = Some(date);
        scene.time = Some(time);
        return;
    }

    if let Some(day) = scn.find("Day") {
        let day = day.text.clone().unwrap_or_default();
        if day.trim().parse::<i64>().is_ok() {
            scene.day = Some(day);
        } else {
            warn(&format!("Day is not a number: {:?}", day));
            scene.day = Some(String::new());
        }
    }

    let hour = scn.find("Hour").map(|h| zero_padded(h.text.as_deref()));
    let minute = scn.find("Minute").map(|m| zero_padded(m.text.as_deref()));
    if hour.is_some() || minute.is_some() {
        scene.time = Some(format!(
            "{}:{}:00",
            hour.unwrap_or_else(|| "00".to_string()),
            minute.unwrap_or_else(|| "00".to_string())
        ));
    }
}

fn read_id_list(scn: &XmlElement, container: &str, tag: &str, known: impl Fn(&str) -> bool) -> Option<Vec<String>> {
    let list = scn.find(container)?;
    Some(
        list.find_all(tag)
            .filter_map(|e| e.text.as_deref())
            .map(|t| t.trim())
            .filter(|id| known(id))
            .map(|id| id.to_string())
            .collect(),
    )
}

pub(super) fn read_scenes(root: &XmlElement, novel: &mut Novel) {
    for scn in root.descendants("SCENE") {
        let Some(sc_id) = element_id(scn) else { continue };
        let mut scene = Scene::default();
        scene.title = opt_text(scn, "Title");
        scene.desc = opt_text(scn, "Desc");
        scene.kw_var = read_kw_var(scn, &SCN_KWVAR);

        if let Some(content) = scn.child_text("SceneContent") {
            scene.set_scene_content(content);
        }

        scene.sc_type = Some(match field_value(scn, "Field_SceneType") {
            Some("1") => ElementType::Notes,
            Some("2") => ElementType::Todo,
            _ if scn.has_child("Unused") => ElementType::Unused,
            _ => ElementType::Normal,
        });

        scene.do_not_export = Some(scn.has_child("ExportCondSpecific") && !scn.has_child("ExportWhenRTF"));

        if let Some(status) = scn.child_text("Status") {
            match status.trim().parse::<i64>().ok().and_then(SceneStatus::from_index) {
                Some(s) => scene.status = Some(s),
                None => warn(&format!("Scene {}: unknown status {:?} ignored", sc_id, status)),
            }
        }

        scene.notes = opt_text(scn, "Notes");
        scene.tags = opt_tags(scn);
        scene.field1 = opt_text(scn, "Field1");
        scene.field2 = opt_text(scn, "Field2");
        scene.field3 = opt_text(scn, "Field3");
        scene.field4 = opt_text(scn, "Field4");
        scene.append_to_prev = Some(scn.has_child("AppendToPrev"));

        read_scene_date(scn, &mut scene);

        scene.lasts_days = opt_text(scn, "LastsDays");
        scene.lasts_hours = opt_text(scn, "LastsHours");
        scene.lasts_minutes = opt_text(scn, "LastsMinutes");
        scene.is_reaction_scene = Some(scn.has_child("ReactionScene"));
        scene.is_sub_plot = Some(scn.has_child("SubPlot"));
        scene.goal = opt_text(scn, "Goal");
        scene.conflict = opt_text(scn, "Conflict");
        scene.outcome = opt_text(scn, "Outcome");
        scene.image = opt_text(scn, "ImageFile");

        scene.characters = read_id_list(scn, "Characters", "CharID", |id| novel.characters.contains_key(id));
        scene.locations = read_id_list(scn, "Locations", "LocID", |id| novel.locations.contains_key(id));
        scene.items = read_id_list(scn, "Items", "ItemID", |id| novel.items.contains_key(id));

        scene.scn_arcs = scene.kw_var.get("Field_SceneArcs").cloned().flatten();
        scene.scn_style = scene.kw_var.get("Field_SceneStyle").cloned().flatten();

        novel.scenes.insert(sc_id, scene);
    }
}

pub(super) fn read_chapters(root: &XmlElement, novel: &mut Novel) {
    novel.srt_chapters.clear();
    for chp in root.descendants("CHAPTER") {
        let Some(ch_id) = element_id(chp) else { continue };
        let mut chapter = Chapter {
            title: opt_text(chp, "Title"),
            desc: opt_text(chp, "Desc"),
            kw_var: KwVar::new(),
            ..Chapter::default()
        };

        chapter.ch_level = Some(if chp.has_child("SectionStart") {
            ChapterLevel::Part
        } else {
            ChapterLevel::Chapter
        });

        // ChapterType supersedes the older Type.
        let unused = chp.has_child("Unused");
        chapter.ch_type = Some(match chp.child_text("ChapterType") {
            Some(ch_type) => match ch_type.trim() {
                "2" => ElementType::Todo,
                "1" => ElementType::Notes,
                _ if unused => ElementType::Unused,
                _ => ElementType::Normal,
            },
            None => match chp.child_text("Type").map(|t| t.trim()) {
                Some("1") => ElementType::Notes,
                _ if unused => ElementType::Unused,
                _ => ElementType::Normal,
            },
        });

        let title_suppressed = chapter.title.as_deref().is_some_and(|t| t.starts_with('@'));
        chapter.suppress_chapter_title =
            Some(title_suppressed || field_value(chp, "Field_SuppressChapterTitle") == Some("1"));
        chapter.is_trash = Some(field_value(chp, "Field_IsTrash") == Some("1"));
        chapter.suppress_chapter_break = Some(field_value(chp, "Field_SuppressChapterBreak") == Some("1"));

        if let Some(scenes) = chp.find("Scenes") {
            chapter.srt_scenes = scenes
                .find_all("ScID")
                .filter_map(|e| e.text.as_deref())
                .map(|t| t.trim().to_string())
                .filter(|id| novel.scenes.contains_key(id))
                .collect();
        }

        novel.srt_chapters.push(ch_id.clone());
        novel.chapters.insert(ch_id, chapter);
    }
}

/// Scenes inherit a non-normal chapter type.
pub(super) fn adjust_scene_types(novel: &mut Novel) {
    for ch_id in &novel.srt_chapters {
        let Some(chapter) = novel.chapters.get(ch_id) else { continue };
        let Some(ch_type) = chapter.ch_type else { continue };
        if ch_type == ElementType::Normal {
            continue;
        }
        for sc_id in &chapter.srt_scenes {
            if let Some(scene) = novel.scenes.get_mut(sc_id) {
                scene.sc_type = Some(ch_type);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specific_date_time() {
        assert_eq!(
            parse_specific_date_time("2024-01-05 10:20:00"),
            ("2024-01-05".to_string(), "10:20:00".to_string())
        );
        assert_eq!(
            parse_specific_date_time("2024-01-05 07:05"),
            ("2024-01-05".to_string(), "07:05:00".to_string())
        );
        assert_eq!(parse_specific_date_time("yesterday"), (String::new(), String::new()));
    }

    #[test]
    fn test_zero_padded() {
        assert_eq!(zero_padded(Some("5")), "05");
        assert_eq!(zero_padded(Some("12")), "12");
    }
}
