//! In-memory representation of a novel project.
//!
//! Entities are kept in insertion-ordered maps keyed by their numeric string ID.
//! Narrative order is defined by the `srt_*` sequences only; the maps are for
//! lookup.

use indexmap::IndexMap;

use crate::helpers::{count_letters, count_words, language_tags};
use crate::logger::warn;

/// Completion state of a scene, stored as 1..5 in the project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SceneStatus {
    Outline = 1,
    Draft = 2,
    FirstEdit = 3,
    SecondEdit = 4,
    Done = 5,
}

impl SceneStatus {
    pub const ALL: [SceneStatus; 5] = [
        SceneStatus::Outline,
        SceneStatus::Draft,
        SceneStatus::FirstEdit,
        SceneStatus::SecondEdit,
        SceneStatus::Done,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        SceneStatus::ALL.iter().copied().find(|s| s.index() == index)
    }

    pub fn index(&self) -> i64 {
        *self as i64
    }

    /// Label as used in spreadsheet lists.
    pub fn label(&self) -> &'static str {
        match self {
            SceneStatus::Outline => "Outline",
            SceneStatus::Draft => "Draft",
            SceneStatus::FirstEdit => "1st Edit",
            SceneStatus::SecondEdit => "2nd Edit",
            SceneStatus::Done => "Done",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        SceneStatus::ALL.iter().copied().find(|s| s.label() == label)
    }
}

/// Chapter and scene type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementType {
    #[default]
    Normal,
    Notes,
    Todo,
    Unused,
}

impl ElementType {
    pub fn index(&self) -> u8 {
        match self {
            ElementType::Normal => 0,
            ElementType::Notes => 1,
            ElementType::Todo => 2,
            ElementType::Unused => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ElementType::Normal),
            1 => Some(ElementType::Notes),
            2 => Some(ElementType::Todo),
            3 => Some(ElementType::Unused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterLevel {
    Chapter,
    Part,
}

/// Extension field name → value. Declared but unset fields hold `None`.
pub type KwVar = IndexMap<String, Option<String>>;

/// Title, description and extension fields. Used as-is for project notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicElement {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapter {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
    pub ch_level: Option<ChapterLevel>,
    pub ch_type: Option<ElementType>,
    pub suppress_chapter_title: Option<bool>,
    pub is_trash: Option<bool>,
    pub suppress_chapter_break: Option<bool>,
    pub srt_scenes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
    scene_content: Option<String>,
    word_count: usize,
    letter_count: usize,
    pub sc_type: Option<ElementType>,
    pub do_not_export: Option<bool>,
    pub status: Option<SceneStatus>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub field1: Option<String>,
    pub field2: Option<String>,
    pub field3: Option<String>,
    pub field4: Option<String>,
    pub append_to_prev: Option<bool>,
    pub is_reaction_scene: Option<bool>,
    pub is_sub_plot: Option<bool>,
    pub goal: Option<String>,
    pub conflict: Option<String>,
    pub outcome: Option<String>,
    pub characters: Option<Vec<String>>,
    pub locations: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    /// ISO date, exclusive with `day`.
    pub date: Option<String>,
    /// `HH:MM:SS`
    pub time: Option<String>,
    pub day: Option<String>,
    pub lasts_minutes: Option<String>,
    pub lasts_hours: Option<String>,
    pub lasts_days: Option<String>,
    pub image: Option<String>,
    pub scn_arcs: Option<String>,
    pub scn_style: Option<String>,
}

impl Scene {
    pub fn scene_content(&self) -> Option<&str> {
        self.scene_content.as_deref()
    }

    /// Set the text and recompute word and letter count.
    pub fn set_scene_content(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.word_count = count_words(&text);
        self.letter_count = count_letters(&text);
        self.scene_content = Some(text);
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn letter_count(&self) -> usize {
        self.letter_count
    }
}

/// Location or item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldElement {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub aka: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Character {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub aka: Option<String>,
    pub notes: Option<String>,
    pub bio: Option<String>,
    pub goals: Option<String>,
    pub full_name: Option<String>,
    pub is_major: Option<bool>,
}

/// The aggregate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Novel {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub kw_var: KwVar,
    pub author_name: Option<String>,
    pub author_bio: Option<String>,
    pub field_title1: Option<String>,
    pub field_title2: Option<String>,
    pub field_title3: Option<String>,
    pub field_title4: Option<String>,
    pub word_target: Option<i64>,
    pub word_count_start: Option<i64>,
    pub language_code: Option<String>,
    pub country_code: Option<String>,
    /// Languages used in `[lang=xx]` tokens. `None` until collected.
    pub languages: Option<Vec<String>>,

    pub chapters: IndexMap<String, Chapter>,
    pub srt_chapters: Vec<String>,
    pub scenes: IndexMap<String, Scene>,
    pub locations: IndexMap<String, WorldElement>,
    pub srt_locations: Vec<String>,
    pub items: IndexMap<String, WorldElement>,
    pub srt_items: Vec<String>,
    pub characters: IndexMap<String, Character>,
    pub srt_characters: Vec<String>,
    pub project_notes: IndexMap<String, BasicElement>,
    pub srt_prj_notes: Vec<String>,
}

impl Novel {
    pub fn new() -> Self {
        Novel::default()
    }

    /// Collect the language codes used in scene content, replacing `languages`.
    pub fn get_languages(&mut self) {
        let mut languages: Vec<String> = Vec::new();
        for scene in self.scenes.values() {
            if let Some(text) = scene.scene_content() {
                for lang in language_tags(text) {
                    if !languages.contains(&lang) {
                        languages.push(lang);
                    }
                }
            }
        }
        self.languages = Some(languages);
    }

    /// Add a language code if it is not known yet.
    pub fn add_language(&mut self, code: &str) {
        let languages = self.languages.get_or_insert_with(Vec::new);
        if !languages.iter().any(|l| l == code) {
            languages.push(code.to_string());
        }
    }

    /// Make sure language and country code form a usable locale.
    ///
    /// Without a language code the fallback is used. A language code that is
    /// not two letters, or a missing country code, gives "zxx"/"none".
    pub fn check_locale(&mut self, fallback_language: &str, fallback_country: &str) {
        let language = self.language_code.clone().unwrap_or_default();
        if language.is_empty() {
            self.language_code = Some(fallback_language.to_string());
            self.country_code = Some(fallback_country.to_string());
            return;
        }

        let valid = language.chars().count() == 2
            && self.country_code.as_ref().is_some_and(|c| c.chars().count() == 2);
        if !valid {
            warn(&format!(
                "Unusable locale {:?}/{:?}, using zxx/none",
                self.language_code, self.country_code
            ));
            self.language_code = Some("zxx".to_string());
            self.country_code = Some("none".to_string());
        }
    }

    /// ID of the chapter whose scene list contains `sc_id`.
    pub fn chapter_of_scene(&self, sc_id: &str) -> Option<&str> {
        self.chapters
            .iter()
            .find(|(_, ch)| ch.srt_scenes.iter().any(|s| s == sc_id))
            .map(|(id, _)| id.as_str())
    }
}
