//! Text documents (`.odt`) read into a [`Novel`].
//!
//! Each [`OdtKind`] has its own [`walker::MarkupHandler`] with an explicit state
//! struct. Documents exported from a project carry the project's chapter and
//! scene IDs in section names; the new-project kinds build the structure from
//! headings instead.

pub mod walker;

mod descriptions;
mod manuscript;
mod new_project;
mod proof;
mod world;

use std::path::{Path, PathBuf};

use crate::app_settings::ConvertSettings;
use crate::helpers::first_digits;
use crate::model::{Chapter, ElementType, Novel, Scene};
use crate::splitter::split_scenes;
use crate::types::{ConvertError, norm_path};
use crate::ui::Translate;

use walker::{MarkupEnd, MarkupTag};

pub const EXTENSION: &str = ".odt";

pub(crate) const COMMENT_START: &str = "/*";
pub(crate) const COMMENT_END: &str = "*/";
pub(crate) const SC_TITLE_BRACKET: char = '~';
pub(crate) const BULLET: &str = "-";
pub(crate) const INDENT: &str = ">";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdtKind {
    Proof,
    Manuscript,
    Notes,
    Todo,
    SceneDesc,
    ChapterDesc,
    PartDesc,
    Characters,
    Locations,
    Items,
    /// New project from a plain document.
    WorkInProgress,
    /// New project from a document with scene headings.
    Outline,
}

impl OdtKind {
    /// Documents that are written back into an existing project.
    pub const IMPORT: [OdtKind; 10] = [
        OdtKind::Proof,
        OdtKind::Manuscript,
        OdtKind::SceneDesc,
        OdtKind::ChapterDesc,
        OdtKind::PartDesc,
        OdtKind::Characters,
        OdtKind::Items,
        OdtKind::Locations,
        OdtKind::Notes,
        OdtKind::Todo,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            OdtKind::Proof => Some("_proof"),
            OdtKind::Manuscript => Some("_manuscript"),
            OdtKind::Notes => Some("_notes"),
            OdtKind::Todo => Some("_todo"),
            OdtKind::SceneDesc => Some("_scenes"),
            OdtKind::ChapterDesc => Some("_chapters"),
            OdtKind::PartDesc => Some("_parts"),
            OdtKind::Characters => Some("_characters"),
            OdtKind::Locations => Some("_locations"),
            OdtKind::Items => Some("_items"),
            OdtKind::WorkInProgress | OdtKind::Outline => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OdtKind::Proof => "Tagged manuscript for proofing",
            OdtKind::Manuscript => "Editable manuscript",
            OdtKind::Notes => "Notes chapters",
            OdtKind::Todo => "Todo chapters",
            OdtKind::SceneDesc => "Scene descriptions",
            OdtKind::ChapterDesc => "Chapter descriptions",
            OdtKind::PartDesc => "Part descriptions",
            OdtKind::Characters => "Character descriptions",
            OdtKind::Locations => "Location descriptions",
            OdtKind::Items => "Item descriptions",
            OdtKind::WorkInProgress => "Work in progress",
            OdtKind::Outline => "Novel outline",
        }
    }

    /// The import kind whose suffix and extension end `file_name`.
    pub fn from_file_name(file_name: &str) -> Option<OdtKind> {
        OdtKind::IMPORT.into_iter().find(|kind| {
            kind.suffix()
                .is_some_and(|suffix| file_name.ends_with(&format!("{}{}", suffix, EXTENSION)))
        })
    }

    /// Manuscript-like documents: inline markup becomes tokens and the text
    /// splitter runs after the read.
    pub fn is_formatted(&self) -> bool {
        matches!(
            self,
            OdtKind::Proof | OdtKind::Manuscript | OdtKind::Notes | OdtKind::Todo | OdtKind::WorkInProgress
        )
    }
}

#[derive(Debug, Clone)]
pub struct OdtReader {
    pub kind: OdtKind,
    pub file_path: PathBuf,
}

impl OdtReader {
    pub fn new(kind: OdtKind, file_path: impl Into<PathBuf>) -> Self {
        OdtReader {
            kind,
            file_path: file_path.into(),
        }
    }

    /// Merge the document into `novel`. Returns whether the text splitter
    /// created chapters or scenes.
    pub fn read(&self, novel: &mut Novel, tr: &dyn Translate, settings: &ConvertSettings) -> Result<bool, ConvertError> {
        let path = self.file_path.as_path();
        tracing::info!("Reading {} as {}", norm_path(path), self.kind.description());

        if self.kind.is_formatted() {
            novel.languages = Some(Vec::new());
        }

        match self.kind {
            OdtKind::Proof => walker::walk_document(path, &mut proof::ProofReader::new(path), novel)?,
            OdtKind::Manuscript => {
                let mut handler = manuscript::ManuscriptReader::new(path, ElementType::Normal);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::Notes => {
                let mut handler = manuscript::ManuscriptReader::new(path, ElementType::Notes);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::Todo => {
                let mut handler = manuscript::ManuscriptReader::new(path, ElementType::Todo);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::SceneDesc => {
                walker::walk_document(path, &mut descriptions::SceneDescReader::new(path), novel)?
            }
            OdtKind::ChapterDesc | OdtKind::PartDesc => {
                walker::walk_document(path, &mut descriptions::ChapterDescReader::new(path), novel)?
            }
            OdtKind::Characters => walker::walk_document(path, &mut world::CharactersReader::default(), novel)?,
            OdtKind::Locations => {
                let mut handler = world::WorldDescReader::new(world::WorldList::Locations);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::Items => {
                let mut handler = world::WorldDescReader::new(world::WorldList::Items);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::WorkInProgress => {
                let mut handler = new_project::WorkInProgressReader::new(settings.low_word_count);
                walker::walk_document(path, &mut handler, novel)?
            }
            OdtKind::Outline => walker::walk_document(path, &mut new_project::OutlineReader::new(path), novel)?,
        }

        if self.kind.is_formatted() {
            Ok(split_scenes(novel, tr, settings.split_title_clip))
        } else {
            Ok(false)
        }
    }
}

/// Text collected for the current scene or field, plus the open language span.
#[derive(Debug, Default)]
pub(crate) struct TextBuffer {
    parts: Vec<String>,
    language: Option<String>,
    /// Index of the first part of the current line.
    line_start: usize,
}

impl TextBuffer {
    pub(crate) fn push(&mut self, text: impl Into<String>) {
        self.parts.push(text.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.parts.clear();
        self.line_start = 0;
    }

    pub(crate) fn text(&self) -> String {
        self.parts.concat()
    }

    pub(crate) fn take(&mut self) -> String {
        let text = self.text();
        self.clear();
        text
    }

    /// Replace the content with `text`.
    pub(crate) fn reset_to(&mut self, text: String) {
        self.parts = vec![text];
        self.line_start = self.parts.len();
    }

    /// End the current line, trimming the text runs pushed since the last
    /// line end as a whole.
    pub(crate) fn end_trimmed_line(&mut self) {
        let line = self.parts.split_off(self.line_start.min(self.parts.len())).concat();
        self.parts.push(format!("{}\n", line.trim()));
        self.line_start = self.parts.len();
    }

    pub(crate) fn open_language(&mut self, novel: &mut Novel, code: &str) {
        self.language = Some(code.to_string());
        novel.add_language(code);
        self.push(format!("[lang={}]", code));
    }

    pub(crate) fn close_language(&mut self) {
        if let Some(code) = self.language.take() {
            self.push(format!("[/lang={}]", code));
        }
    }

    /// Opening token of an inline tag. Returns `false` for tags without one.
    pub(crate) fn push_start(&mut self, novel: &mut Novel, tag: &MarkupTag) -> bool {
        match tag {
            MarkupTag::Emphasis => self.push("[i]"),
            MarkupTag::Strong => self.push("[b]"),
            MarkupTag::Lang(code) | MarkupTag::Paragraph { lang: Some(code) } => self.open_language(novel, code),
            MarkupTag::Paragraph { lang: None } => {}
            MarkupTag::ListItem => self.push(format!("{} ", BULLET)),
            MarkupTag::Blockquote { lang } => {
                self.push(format!("{} ", INDENT));
                if let Some(code) = lang {
                    self.open_language(novel, code);
                }
            }
            _ => return false,
        }
        true
    }

    /// Closing token of an inline tag. Paragraphs end with a newline.
    pub(crate) fn push_end(&mut self, tag: MarkupEnd) -> bool {
        match tag {
            MarkupEnd::Emphasis => self.push("[/i]"),
            MarkupEnd::Strong => self.push("[/b]"),
            MarkupEnd::Lang => self.close_language(),
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => {
                self.close_language();
                self.push("\n");
            }
            _ => return false,
        }
        true
    }
}

/// Merge adjacent close/open pairs of the same inline tag.
pub(crate) fn cleanup_scene(text: &str, languages: &[String]) -> String {
    let mut tags: Vec<String> = vec!["i".to_string(), "b".to_string()];
    tags.extend(languages.iter().map(|l| format!("lang={}", l)));

    let mut text = text.to_string();
    for tag in &tags {
        text = text.replace(&format!("[/{tag}][{tag}]"), "");
        text = text.replace(&format!("[/{tag}]\n[{tag}]"), "\n");
        text = text.replace(&format!("[/{tag}]\n{INDENT} [{tag}]"), &format!("\n{INDENT} "));
    }
    text
}

/// Finished scene text of a formatted document.
pub(crate) fn finish_scene_text(novel: &Novel, text: &str) -> String {
    let languages = novel.languages.clone().unwrap_or_default();
    cleanup_scene(text, &languages).trim_end().to_string()
}

/// Default locale of the document.
pub(crate) fn apply_body_locale(novel: &mut Novel, language: &Option<String>, country: &Option<String>) {
    if let Some(language) = language.as_ref().filter(|l| !l.is_empty()) {
        novel.language_code = Some(language.clone());
    }
    if let Some(country) = country.as_ref().filter(|c| !c.is_empty()) {
        novel.country_code = Some(country.clone());
    }
}

/// Text between a `~` pair, used as scene title.
pub(crate) fn bracketed_title(comment: &str) -> Option<String> {
    comment
        .split(SC_TITLE_BRACKET)
        .nth(1)
        .map(|t| t.trim().to_string())
}

/// Current chapter and scene of a document with `ChID`/`ScID` sections.
#[derive(Debug)]
pub(crate) struct SectionCursor {
    path: PathBuf,
    pub(crate) ch_id: Option<String>,
    pub(crate) sc_id: Option<String>,
}

impl SectionCursor {
    pub(crate) fn new(path: &Path) -> Self {
        SectionCursor {
            path: path.to_path_buf(),
            ch_id: None,
            sc_id: None,
        }
    }

    /// Enter the chapter or scene named by a section, creating it if the
    /// project does not have it yet. Sections with other names are ignored.
    pub(crate) fn open(&mut self, novel: &mut Novel, name: &str, element_type: ElementType) -> Result<(), ConvertError> {
        if name.starts_with("ScID") {
            let Some(sc_id) = first_digits(name) else {
                return Ok(());
            };
            if !novel.scenes.contains_key(&sc_id) {
                let chapter = self
                    .ch_id
                    .as_ref()
                    .and_then(|ch_id| novel.chapters.get_mut(ch_id))
                    .ok_or_else(|| ConvertError::malformed_document(&self.path, &format!("scene {} outside of a chapter", sc_id)))?;
                chapter.srt_scenes.push(sc_id.clone());
                novel.scenes.insert(sc_id.clone(), Scene::default());
                tracing::debug!("New scene {}", sc_id);
            }
            if let Some(scene) = novel.scenes.get_mut(&sc_id) {
                scene.sc_type = Some(element_type);
            }
            self.sc_id = Some(sc_id);
        } else if name.starts_with("ChID") {
            let Some(ch_id) = first_digits(name) else {
                return Ok(());
            };
            if !novel.chapters.contains_key(&ch_id) {
                novel.chapters.insert(ch_id.clone(), Chapter::default());
                novel.srt_chapters.push(ch_id.clone());
                tracing::debug!("New chapter {}", ch_id);
            }
            if let Some(chapter) = novel.chapters.get_mut(&ch_id) {
                chapter.ch_type = Some(element_type);
            }
            self.ch_id = Some(ch_id);
        }
        Ok(())
    }
}
