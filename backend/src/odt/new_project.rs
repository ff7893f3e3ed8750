//! Readers that build a new project from a document without IDs.

use std::path::{Path, PathBuf};

use crate::model::{Chapter, ChapterLevel, ElementType, Novel, Scene, SceneStatus};
use crate::types::ConvertError;

use super::walker::{MarkupEnd, MarkupHandler, MarkupTag, MetaField};
use super::{COMMENT_END, COMMENT_START, TextBuffer, apply_body_locale, finish_scene_text};

const SCENE_DIVIDER: &str = "* * *";

/// Chapter IDs are counted from 1; heading 1 opens a part, heading 2 a chapter.
fn new_chapter(novel: &mut Novel, ch_count: &mut usize, level: u8) -> String {
    *ch_count += 1;
    let ch_id = ch_count.to_string();
    let chapter = Chapter {
        ch_level: Some(if level == 1 { ChapterLevel::Part } else { ChapterLevel::Chapter }),
        ch_type: Some(ElementType::Normal),
        ..Chapter::default()
    };
    novel.chapters.insert(ch_id.clone(), chapter);
    novel.srt_chapters.push(ch_id.clone());
    ch_id
}

fn apply_meta(novel: &mut Novel, field: MetaField, content: &str) {
    match field {
        MetaField::Author => novel.author_name = Some(content.to_string()),
        MetaField::Description => novel.desc = Some(content.to_string()),
    }
}

/// A draft: headings give parts and chapters, paragraphs become scenes split
/// at `* * *` dividers.
#[derive(Debug)]
pub(crate) struct WorkInProgressReader {
    low_word_count: usize,
    ch_count: usize,
    sc_count: usize,
    ch_id: Option<String>,
    sc_id: Option<String>,
    buf: TextBuffer,
}

impl WorkInProgressReader {
    pub(crate) fn new(low_word_count: usize) -> Self {
        WorkInProgressReader {
            low_word_count,
            ch_count: 0,
            sc_count: 0,
            ch_id: None,
            sc_id: None,
            buf: TextBuffer::default(),
        }
    }

    fn open_scene(&mut self, novel: &mut Novel) {
        let Some(chapter) = self.ch_id.as_ref().and_then(|ch_id| novel.chapters.get_mut(ch_id)) else {
            return;
        };
        self.sc_count += 1;
        let sc_id = self.sc_count.to_string();
        chapter.srt_scenes.push(sc_id.clone());

        let mut scene = Scene::default();
        scene.title = Some(format!("Scene {}", self.sc_count));
        scene.status = Some(SceneStatus::Outline);
        novel.scenes.insert(sc_id.clone(), scene);
        self.sc_id = Some(sc_id);
        self.buf.clear();
    }
}

impl MarkupHandler for WorkInProgressReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        match tag {
            MarkupTag::Paragraph { .. } | MarkupTag::Blockquote { .. } | MarkupTag::ListItem => {
                if self.sc_id.is_none() {
                    self.open_scene(novel);
                }
                self.buf.push_start(novel, tag);
            }
            MarkupTag::Emphasis | MarkupTag::Strong | MarkupTag::Lang(_) => {
                self.buf.push_start(novel, tag);
            }
            MarkupTag::Heading(level @ (1 | 2)) => {
                self.sc_id = None;
                self.buf.clear();
                self.ch_id = Some(new_chapter(novel, &mut self.ch_count, *level));
            }
            MarkupTag::Section(_) => {
                self.sc_id = None;
                self.ch_id = None;
            }
            MarkupTag::Meta { field, content } => apply_meta(novel, *field, content),
            MarkupTag::Title => self.buf.clear(),
            MarkupTag::Body { language, country } => apply_body_locale(novel, language, country),
            _ => {}
        }
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        match tag {
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => {
                self.buf.push_end(tag);
                if let Some(sc_id) = &self.sc_id {
                    let text = finish_scene_text(novel, &self.buf.text());
                    if let Some(scene) = novel.scenes.get_mut(sc_id) {
                        scene.set_scene_content(text);
                        scene.status = if scene.word_count() < self.low_word_count {
                            Some(SceneStatus::Outline)
                        } else {
                            Some(SceneStatus::Draft)
                        };
                    }
                }
            }
            MarkupEnd::Emphasis | MarkupEnd::Strong | MarkupEnd::Lang => {
                self.buf.push_end(tag);
            }
            MarkupEnd::Heading(1 | 2) => {
                let title = self.buf.take().trim().to_string();
                if let Some(chapter) = self.ch_id.as_ref().and_then(|ch_id| novel.chapters.get_mut(ch_id)) {
                    chapter.title = Some(title);
                }
            }
            MarkupEnd::Title => novel.title = Some(self.buf.take().trim().to_string()),
            _ => {}
        }
        Ok(())
    }

    fn handle_data(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.sc_id.is_some() && data.contains(SCENE_DIVIDER) {
            self.sc_id = None;
        } else {
            self.buf.push(data);
        }
        Ok(())
    }

    fn handle_comment(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        let Some(sc_id) = &self.sc_id else {
            return Ok(());
        };
        if self.buf.is_empty() {
            if let Some(scene) = novel.scenes.get_mut(sc_id) {
                scene.title = Some(data.trim().to_string());
            }
        } else {
            self.buf.push(format!("{}{}{}", COMMENT_START, data.trim(), COMMENT_END));
        }
        Ok(())
    }
}

/// An outline: heading 1/2 give parts and chapters, heading 3 gives an empty
/// scene, paragraphs are descriptions.
#[derive(Debug)]
pub(crate) struct OutlineReader {
    path: PathBuf,
    ch_count: usize,
    sc_count: usize,
    ch_id: Option<String>,
    sc_id: Option<String>,
    buf: TextBuffer,
}

impl OutlineReader {
    pub(crate) fn new(path: &Path) -> Self {
        OutlineReader {
            path: path.to_path_buf(),
            ch_count: 0,
            sc_count: 0,
            ch_id: None,
            sc_id: None,
            buf: TextBuffer::default(),
        }
    }
}

impl MarkupHandler for OutlineReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        match tag {
            MarkupTag::Heading(level @ (1 | 2)) => {
                self.sc_id = None;
                self.buf.clear();
                self.ch_id = Some(new_chapter(novel, &mut self.ch_count, *level));
            }
            MarkupTag::Heading(3) => {
                let chapter = self
                    .ch_id
                    .as_ref()
                    .and_then(|ch_id| novel.chapters.get_mut(ch_id))
                    .ok_or_else(|| ConvertError::malformed_document(&self.path, "scene heading before the first chapter"))?;
                self.buf.clear();
                self.sc_count += 1;
                let sc_id = self.sc_count.to_string();
                chapter.srt_scenes.push(sc_id.clone());

                let mut scene = Scene::default();
                scene.status = Some(SceneStatus::Outline);
                scene.set_scene_content("");
                novel.scenes.insert(sc_id.clone(), scene);
                self.sc_id = Some(sc_id);
            }
            MarkupTag::Section(_) => {
                self.sc_id = None;
                self.ch_id = None;
            }
            MarkupTag::Meta { field, content } => apply_meta(novel, *field, content),
            MarkupTag::Title => self.buf.clear(),
            MarkupTag::Body { language, country } => apply_body_locale(novel, language, country),
            _ => {}
        }
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        match tag {
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => {
                let text = format!("{}\n", self.buf.text().trim());
                let desc = Some(text.trim_end().to_string());
                self.buf.reset_to(text);
                if let Some(scene) = self.sc_id.as_ref().and_then(|sc_id| novel.scenes.get_mut(sc_id)) {
                    scene.desc = desc;
                } else if let Some(chapter) = self.ch_id.as_ref().and_then(|ch_id| novel.chapters.get_mut(ch_id)) {
                    chapter.desc = desc;
                }
            }
            MarkupEnd::Heading(1 | 2) => {
                let title = self.buf.take().trim().to_string();
                if let Some(chapter) = self.ch_id.as_ref().and_then(|ch_id| novel.chapters.get_mut(ch_id)) {
                    chapter.title = Some(title);
                }
            }
            MarkupEnd::Heading(3) => {
                let title = self.buf.take().trim().to_string();
                if let Some(scene) = self.sc_id.as_ref().and_then(|sc_id| novel.scenes.get_mut(sc_id)) {
                    scene.title = Some(title);
                }
            }
            MarkupEnd::Title => novel.title = Some(self.buf.take().trim().to_string()),
            _ => {}
        }
        Ok(())
    }

    fn handle_data(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        self.buf.push(data);
        Ok(())
    }
}
