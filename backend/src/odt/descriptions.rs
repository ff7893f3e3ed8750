use std::path::Path;

use crate::model::{ElementType, Novel};
use crate::types::ConvertError;

use super::walker::{MarkupEnd, MarkupHandler, MarkupTag};
use super::{COMMENT_END, COMMENT_START, SC_TITLE_BRACKET, SectionCursor, TextBuffer, bracketed_title};

/// Scene descriptions. A leading `~ title ~` comment renames the scene.
#[derive(Debug)]
pub(crate) struct SceneDescReader {
    cursor: SectionCursor,
    buf: TextBuffer,
}

impl SceneDescReader {
    pub(crate) fn new(path: &Path) -> Self {
        SceneDescReader {
            cursor: SectionCursor::new(path),
            buf: TextBuffer::default(),
        }
    }
}

/// Split a leading comment off the description text.
fn split_title_comment(text: &str) -> (Option<String>, &str) {
    if let Some(rest) = text.strip_prefix(COMMENT_START) {
        if let Some((comment, desc)) = rest.split_once(COMMENT_END) {
            let title = if comment.contains(SC_TITLE_BRACKET) {
                bracketed_title(comment)
            } else {
                None
            };
            return (title, desc);
        }
    }
    (None, text)
}

impl MarkupHandler for SceneDescReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        if let MarkupTag::Section(name) = tag {
            self.cursor.open(novel, name, ElementType::Normal)?;
        }
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        if let Some(sc_id) = self.cursor.sc_id.clone() {
            match tag {
                MarkupEnd::Section => {
                    let text = self.buf.take();
                    let (title, desc) = split_title_comment(&text);
                    if let Some(scene) = novel.scenes.get_mut(&sc_id) {
                        if title.is_some() {
                            scene.title = title;
                        }
                        scene.desc = Some(desc.trim_end().to_string());
                    }
                    self.cursor.sc_id = None;
                }
                MarkupEnd::Paragraph | MarkupEnd::Blockquote => self.buf.push("\n"),
                _ => {}
            }
        } else if self.cursor.ch_id.is_some() && tag == MarkupEnd::Section {
            self.cursor.ch_id = None;
        }
        Ok(())
    }

    fn handle_data(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.cursor.sc_id.is_some() {
            self.buf.push(data);
        } else if let Some(ch_id) = &self.cursor.ch_id {
            if let Some(chapter) = novel.chapters.get_mut(ch_id) {
                if chapter.title.as_deref().unwrap_or("").is_empty() {
                    chapter.title = Some(data.trim().to_string());
                }
            }
        }
        Ok(())
    }

    fn handle_comment(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.cursor.sc_id.is_some() {
            self.buf.push(format!("{}{}{}", COMMENT_START, data, COMMENT_END));
        }
        Ok(())
    }
}

/// Chapter and part descriptions. The heading supplies a missing title.
#[derive(Debug)]
pub(crate) struct ChapterDescReader {
    cursor: SectionCursor,
    buf: TextBuffer,
}

impl ChapterDescReader {
    pub(crate) fn new(path: &Path) -> Self {
        ChapterDescReader {
            cursor: SectionCursor::new(path),
            buf: TextBuffer::default(),
        }
    }
}

impl MarkupHandler for ChapterDescReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        if let MarkupTag::Section(name) = tag {
            self.cursor.open(novel, name, ElementType::Normal)?;
        }
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        let Some(ch_id) = self.cursor.ch_id.clone() else {
            return Ok(());
        };
        let Some(chapter) = novel.chapters.get_mut(&ch_id) else {
            return Ok(());
        };
        match tag {
            MarkupEnd::Section => {
                chapter.desc = Some(self.buf.take().trim_end().to_string());
                self.cursor.ch_id = None;
            }
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => self.buf.end_trimmed_line(),
            MarkupEnd::Heading(_) => {
                let heading = self.buf.take().trim().to_string();
                if chapter.title.as_deref().unwrap_or("").is_empty() {
                    chapter.title = Some(heading);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_data(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.cursor.ch_id.is_some() {
            self.buf.push(data);
        }
        Ok(())
    }
}
