use std::path::{Path, PathBuf};

use crate::helpers::first_digits;
use crate::model::{Chapter, Novel, Scene};
use crate::splitter::{CHAPTER_SEPARATOR, PART_SEPARATOR};
use crate::types::ConvertError;

use super::walker::{MarkupEnd, MarkupHandler, MarkupTag};
use super::{TextBuffer, apply_body_locale, finish_scene_text};

/// Proof reading copy: chapters and scenes are delimited by `[ChID:n]`,
/// `[/ChID]`, `[ScID:n]` and `[/ScID]` paragraphs instead of sections.
#[derive(Debug)]
pub(crate) struct ProofReader {
    path: PathBuf,
    ch_id: Option<String>,
    sc_id: Option<String>,
    buf: TextBuffer,
}

impl ProofReader {
    pub(crate) fn new(path: &Path) -> Self {
        ProofReader {
            path: path.to_path_buf(),
            ch_id: None,
            sc_id: None,
            buf: TextBuffer::default(),
        }
    }

    fn open_scene(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        let Some(sc_id) = first_digits(data) else {
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
        }
        self.sc_id = Some(sc_id);
        self.buf.clear();
        Ok(())
    }

    fn close_scene(&mut self, novel: &mut Novel) {
        if let Some(sc_id) = self.sc_id.take() {
            let text = finish_scene_text(novel, &self.buf.take());
            if let Some(scene) = novel.scenes.get_mut(&sc_id) {
                scene.set_scene_content(text.trim_start());
            }
        }
    }

    fn open_chapter(&mut self, novel: &mut Novel, data: &str) {
        let Some(ch_id) = first_digits(data) else {
            return;
        };
        if !novel.chapters.contains_key(&ch_id) {
            novel.chapters.insert(ch_id.clone(), Chapter::default());
            novel.srt_chapters.push(ch_id.clone());
        }
        self.ch_id = Some(ch_id);
    }
}

impl MarkupHandler for ProofReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        match tag {
            MarkupTag::Heading(2) => self.buf.push(format!("{} ", CHAPTER_SEPARATOR)),
            MarkupTag::Heading(1) => self.buf.push(format!("{} ", PART_SEPARATOR)),
            MarkupTag::Body { language, country } => apply_body_locale(novel, language, country),
            _ => {
                self.buf.push_start(novel, tag);
            }
        }
        Ok(())
    }

    fn handle_endtag(&mut self, _novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        match tag {
            MarkupEnd::Heading(1) | MarkupEnd::Heading(2) => {
                self.buf.close_language();
                self.buf.push("\n");
            }
            _ => {
                self.buf.push_end(tag);
            }
        }
        Ok(())
    }

    fn handle_data(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if data.contains("[ScID") {
            self.open_scene(novel, data)?;
        } else if data.contains("[/ScID") {
            self.close_scene(novel);
        } else if data.contains("[ChID") {
            self.open_chapter(novel, data);
        } else if data.contains("[/ChID") {
            self.ch_id = None;
        } else if self.sc_id.is_some() {
            self.buf.push(data);
        }
        Ok(())
    }
}
