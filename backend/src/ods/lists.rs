//! Spreadsheet lists merged into the project.
//!
//! A cell that is blank never erases an existing value; enumerated columns
//! (A/R, ratings, importance) are always applied.

use lazy_static::lazy_static;
use regex::Regex;

use crate::helpers::string_to_list;
use crate::model::{Novel, SceneStatus, WorldElement};

pub const DIVIDER: &str = ", ";

const REACTION_MARKER: &str = "r";
const MAJOR_MARKER: &str = "Major";
const SCENE_RATINGS: [&str; 9] = ["2", "3", "4", "5", "6", "7", "8", "9", "10"];

lazy_static! {
    // ScID:12 in the first cell
    static ref RE_ROW_ID: Regex = Regex::new(r"(ScID|CrID|LcID|ItID):([0-9]+)").unwrap();
}

/// Scene list columns.
pub const SCENE_LIST_COLUMNS: [&str; 21] = [
    "Scene link", "Scene title", "Scene description", "Tags", "Scene notes", "A/R",
    "Goal", "Conflict", "Outcome", "Scene", "Words total",
    "$FieldTitle1", "$FieldTitle2", "$FieldTitle3", "$FieldTitle4",
    "Word count", "Letter count", "Status", "Characters", "Locations", "Items",
];

pub const CHAR_LIST_COLUMNS: [&str; 10] = [
    "ID", "Name", "Full name", "Aka", "Description", "Bio", "Goals", "Importance", "Tags", "Notes",
];

/// Location and item list columns.
pub const WORLD_LIST_COLUMNS: [&str; 5] = ["ID", "Name", "Description", "Aka", "Tags"];

/// The ID in the first cell, if it carries `prefix`.
pub(crate) fn row_id(cell: &str, prefix: &str) -> Option<String> {
    RE_ROW_ID
        .captures_iter(cell)
        .find(|c| c.get(1).is_some_and(|m| m.as_str() == prefix))
        .and_then(|c| c.get(2).map(|m| m.as_str().to_string()))
}

/// Set `field` from a text cell, unless the cell is blank.
fn merge_text(field: &mut Option<String>, cell: &str) {
    let text = cell.trim_end();
    if !text.is_empty() {
        *field = Some(text.to_string());
    }
}

fn merge_tags(field: &mut Option<Vec<String>>, cell: &str) {
    let tags = string_to_list(cell, DIVIDER);
    if !tags.is_empty() {
        *field = Some(tags);
    }
}

fn rating(cell: &str) -> String {
    let cell = cell.trim();
    if SCENE_RATINGS.contains(&cell) {
        cell.to_string()
    } else {
        "1".to_string()
    }
}

pub(crate) fn merge_scene_list(novel: &mut Novel, rows: &[Vec<String>]) {
    for cells in rows {
        let Some(sc_id) = row_id(&cells[0], "ScID") else {
            continue;
        };
        let scene = novel.scenes.entry(sc_id).or_default();

        merge_text(&mut scene.title, &cells[1]);
        merge_text(&mut scene.desc, &cells[2]);
        merge_tags(&mut scene.tags, &cells[3]);
        merge_text(&mut scene.notes, &cells[4]);
        scene.is_reaction_scene = Some(cells[5].to_lowercase().contains(REACTION_MARKER));
        merge_text(&mut scene.goal, &cells[6]);
        merge_text(&mut scene.conflict, &cells[7]);
        merge_text(&mut scene.outcome, &cells[8]);
        // 9, 10: scene number and words total are computed on export.
        scene.field1 = Some(rating(&cells[11]));
        scene.field2 = Some(rating(&cells[12]));
        scene.field3 = Some(rating(&cells[13]));
        scene.field4 = Some(rating(&cells[14]));
        // 15, 16: word and letter count.
        if let Some(status) = SceneStatus::from_label(cells[17].trim()) {
            scene.status = Some(status);
        }
        // 18-20: characters, locations and items are listed by name only.
    }
}

pub(crate) fn merge_char_list(novel: &mut Novel, rows: &[Vec<String>]) {
    novel.srt_characters.clear();
    for cells in rows {
        let Some(cr_id) = row_id(&cells[0], "CrID") else {
            continue;
        };
        novel.srt_characters.push(cr_id.clone());
        let character = novel.characters.entry(cr_id).or_default();

        merge_text(&mut character.title, &cells[1]);
        merge_text(&mut character.full_name, &cells[2]);
        merge_text(&mut character.aka, &cells[3]);
        merge_text(&mut character.desc, &cells[4]);
        merge_text(&mut character.bio, &cells[5]);
        merge_text(&mut character.goals, &cells[6]);
        character.is_major = Some(cells[7].contains(MAJOR_MARKER));
        merge_tags(&mut character.tags, &cells[8]);
        merge_text(&mut character.notes, &cells[9]);
    }
}

fn merge_world_element(element: &mut WorldElement, cells: &[String]) {
    merge_text(&mut element.title, &cells[1]);
    merge_text(&mut element.desc, &cells[2]);
    merge_text(&mut element.aka, &cells[3]);
    merge_tags(&mut element.tags, &cells[4]);
}

pub(crate) fn merge_loc_list(novel: &mut Novel, rows: &[Vec<String>]) {
    novel.srt_locations.clear();
    for cells in rows {
        let Some(lc_id) = row_id(&cells[0], "LcID") else {
            continue;
        };
        novel.srt_locations.push(lc_id.clone());
        merge_world_element(novel.locations.entry(lc_id).or_default(), cells);
    }
}

pub(crate) fn merge_item_list(novel: &mut Novel, rows: &[Vec<String>]) {
    novel.srt_items.clear();
    for cells in rows {
        let Some(it_id) = row_id(&cells[0], "ItID") else {
            continue;
        };
        novel.srt_items.push(it_id.clone());
        merge_world_element(novel.items.entry(it_id).or_default(), cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scene;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_id() {
        assert_eq!(row_id("ScID:12", "ScID"), Some("12".to_string()));
        assert_eq!(row_id("=HYPERLINK(\"file:///x_manuscript.odt#ScID:3\";\"ScID:3\")", "ScID"), Some("3".to_string()));
        assert_eq!(row_id("CrID:1", "ScID"), None);
        assert_eq!(row_id("Scene link", "ScID"), None);
    }

    #[test]
    fn test_blank_cell_keeps_description() {
        let mut novel = Novel::new();
        novel.locations.insert(
            "1".to_string(),
            WorldElement {
                title: Some("Inn".to_string()),
                desc: Some("A dark place.".to_string()),
                ..WorldElement::default()
            },
        );
        novel.srt_locations.push("1".to_string());

        merge_loc_list(
            &mut novel,
            &[row(&["ID", "Name", "Description", "Aka", "Tags"]), row(&["LcID:1", "The Inn", "", "", "old, dark, old"])],
        );

        let inn = &novel.locations["1"];
        assert_eq!(inn.title.as_deref(), Some("The Inn"));
        assert_eq!(inn.desc.as_deref(), Some("A dark place."));
        assert_eq!(inn.aka, None);
        assert_eq!(inn.tags, Some(vec!["old".to_string(), "dark".to_string()]));
        assert_eq!(novel.srt_locations, vec!["1"]);
    }

    #[test]
    fn test_scene_list_enumerations() {
        let mut novel = Novel::new();
        let mut scene = Scene::default();
        scene.status = Some(SceneStatus::Draft);
        novel.scenes.insert("3".to_string(), scene);

        let mut cells = vec![""; 21];
        cells[0] = "ScID:3";
        cells[1] = "Arrival ";
        cells[5] = "R";
        cells[11] = "7";
        cells[12] = "11";
        cells[17] = "2nd Edit";
        merge_scene_list(&mut novel, &[row(&cells)]);

        let scene = &novel.scenes["3"];
        assert_eq!(scene.title.as_deref(), Some("Arrival"));
        assert_eq!(scene.is_reaction_scene, Some(true));
        assert_eq!(scene.field1.as_deref(), Some("7"));
        assert_eq!(scene.field2.as_deref(), Some("1"));
        assert_eq!(scene.status, Some(SceneStatus::SecondEdit));

        cells[17] = "Polished";
        cells[5] = "A";
        merge_scene_list(&mut novel, &[row(&cells)]);
        let scene = &novel.scenes["3"];
        assert_eq!(scene.status, Some(SceneStatus::SecondEdit));
        assert_eq!(scene.is_reaction_scene, Some(false));
    }

    #[test]
    fn test_char_list_redefines_order() {
        let mut novel = Novel::new();
        novel.srt_characters = vec!["1".to_string(), "2".to_string()];
        let rows = [
            row(&["CrID:2", "Bob", "", "", "", "", "", "Major Character", "", ""]),
            row(&["CrID:7", "Eve", "Eve Smith", "", "Spy", "", "", "Minor Character", "", ""]),
        ];
        merge_char_list(&mut novel, &rows);
        assert_eq!(novel.srt_characters, vec!["2", "7"]);
        assert_eq!(novel.characters["2"].is_major, Some(true));
        assert_eq!(novel.characters["7"].is_major, Some(false));
        assert_eq!(novel.characters["7"].full_name.as_deref(), Some("Eve Smith"));
    }
}
