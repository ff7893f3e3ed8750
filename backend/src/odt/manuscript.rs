use std::path::Path;

use crate::model::{ElementType, Novel};
use crate::splitter::{CHAPTER_SEPARATOR, PART_SEPARATOR};
use crate::types::ConvertError;

use super::walker::{MarkupEnd, MarkupHandler, MarkupTag};
use super::{COMMENT_END, COMMENT_START, SC_TITLE_BRACKET, SectionCursor, TextBuffer};
use super::{apply_body_locale, bracketed_title, finish_scene_text};

/// Manuscript, notes and to-do documents.
#[derive(Debug)]
pub(crate) struct ManuscriptReader {
    element_type: ElementType,
    cursor: SectionCursor,
    buf: TextBuffer,
    /// Inside the scene title heading, which is not part of the text.
    in_scene_title: bool,
}

impl ManuscriptReader {
    pub(crate) fn new(path: &Path, element_type: ElementType) -> Self {
        ManuscriptReader {
            element_type,
            cursor: SectionCursor::new(path),
            buf: TextBuffer::default(),
            in_scene_title: false,
        }
    }
}

impl MarkupHandler for ManuscriptReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        match tag {
            MarkupTag::Section(name) => {
                let in_scene = self.cursor.sc_id.is_some();
                self.cursor.open(novel, name, self.element_type)?;
                if !in_scene && self.cursor.sc_id.is_some() {
                    self.buf.clear();
                }
            }
            MarkupTag::Body { language, country } => apply_body_locale(novel, language, country),
            _ if self.cursor.sc_id.is_some() => match tag {
                MarkupTag::Heading(3) => self.in_scene_title = true,
                MarkupTag::Heading(2) => self.buf.push(format!("{} ", CHAPTER_SEPARATOR)),
                MarkupTag::Heading(1) => self.buf.push(format!("{} ", PART_SEPARATOR)),
                _ => {
                    self.buf.push_start(novel, tag);
                }
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        if let Some(sc_id) = self.cursor.sc_id.clone() {
            match tag {
                MarkupEnd::Section => {
                    let text = finish_scene_text(novel, &self.buf.take());
                    if let Some(scene) = novel.scenes.get_mut(&sc_id) {
                        scene.set_scene_content(text);
                    }
                    self.cursor.sc_id = None;
                }
                MarkupEnd::Heading(3) => self.in_scene_title = false,
                MarkupEnd::Heading(1) | MarkupEnd::Heading(2) => self.buf.push("\n"),
                _ => {
                    self.buf.push_end(tag);
                }
            }
        } else if self.cursor.ch_id.is_some() && tag == MarkupEnd::Section {
            self.cursor.ch_id = None;
        }
        Ok(())
    }

    fn handle_data(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.in_scene_title {
            return Ok(());
        }
        if self.cursor.sc_id.is_some() {
            self.buf.push(data);
        } else if let Some(ch_id) = &self.cursor.ch_id {
            if let Some(chapter) = novel.chapters.get_mut(ch_id) {
                if chapter.title.is_none() && !data.trim().is_empty() {
                    chapter.title = Some(data.trim().to_string());
                }
            }
        }
        Ok(())
    }

    fn handle_comment(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        let Some(sc_id) = &self.cursor.sc_id else {
            return Ok(());
        };
        if data.contains(SC_TITLE_BRACKET) {
            if let (Some(title), Some(scene)) = (bracketed_title(data), novel.scenes.get_mut(sc_id)) {
                scene.title = Some(title);
            }
        } else {
            self.buf.push(format!("{}{}{}", COMMENT_START, data.trim(), COMMENT_END));
        }
        Ok(())
    }
}
