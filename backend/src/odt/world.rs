use crate::helpers::first_digits;
use crate::model::{Character, Novel, WorldElement};
use crate::types::ConvertError;

use super::TextBuffer;
use super::walker::{MarkupEnd, MarkupHandler, MarkupTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharacterField {
    Desc,
    Bio,
    Goals,
    Notes,
}

/// Character descriptions. Each character has up to four sections,
/// `CrID_descN`, `CrID_bioN`, `CrID_goalsN` and `CrID_notesN`.
#[derive(Debug, Default)]
pub(crate) struct CharactersReader {
    cr_id: Option<String>,
    field: Option<CharacterField>,
    buf: TextBuffer,
}

impl MarkupHandler for CharactersReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        let MarkupTag::Section(name) = tag else {
            return Ok(());
        };
        let field = if name.starts_with("CrID_desc") {
            CharacterField::Desc
        } else if name.starts_with("CrID_bio") {
            CharacterField::Bio
        } else if name.starts_with("CrID_goals") {
            CharacterField::Goals
        } else if name.starts_with("CrID_notes") {
            CharacterField::Notes
        } else {
            return Ok(());
        };

        let cr_id = first_digits(name);
        if let Some(cr_id) = &cr_id {
            // Only a description section introduces a character.
            if field == CharacterField::Desc && !novel.characters.contains_key(cr_id) {
                novel.characters.insert(cr_id.clone(), Character::default());
                novel.srt_characters.push(cr_id.clone());
            }
        }
        self.cr_id = cr_id.filter(|id| novel.characters.contains_key(id));
        self.field = Some(field);
        self.buf.clear();
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        let Some(cr_id) = &self.cr_id else {
            return Ok(());
        };
        match tag {
            MarkupEnd::Section => {
                let Some(field) = self.field.take() else {
                    return Ok(());
                };
                let text = Some(self.buf.take().trim_end().to_string());
                if let Some(character) = novel.characters.get_mut(cr_id) {
                    match field {
                        CharacterField::Desc => character.desc = text,
                        CharacterField::Bio => character.bio = text,
                        CharacterField::Goals => character.goals = text,
                        CharacterField::Notes => character.notes = text,
                    }
                }
            }
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => self.buf.end_trimmed_line(),
            _ => {}
        }
        Ok(())
    }

    fn handle_data(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.field.is_some() && self.cr_id.is_some() {
            self.buf.push(data);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorldList {
    Locations,
    Items,
}

impl WorldList {
    fn prefix(&self) -> &'static str {
        match self {
            WorldList::Locations => "LcID",
            WorldList::Items => "ItID",
        }
    }
}

/// Location or item descriptions, one `LcIDn`/`ItIDn` section each.
#[derive(Debug)]
pub(crate) struct WorldDescReader {
    list: WorldList,
    id: Option<String>,
    buf: TextBuffer,
}

impl WorldDescReader {
    pub(crate) fn new(list: WorldList) -> Self {
        WorldDescReader {
            list,
            id: None,
            buf: TextBuffer::default(),
        }
    }
}

impl MarkupHandler for WorldDescReader {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError> {
        let MarkupTag::Section(name) = tag else {
            return Ok(());
        };
        if !name.starts_with(self.list.prefix()) {
            return Ok(());
        }
        let Some(id) = first_digits(name) else {
            return Ok(());
        };

        let (elements, srt) = match self.list {
            WorldList::Locations => (&mut novel.locations, &mut novel.srt_locations),
            WorldList::Items => (&mut novel.items, &mut novel.srt_items),
        };
        if !elements.contains_key(&id) {
            elements.insert(id.clone(), WorldElement::default());
            srt.push(id.clone());
        }
        self.id = Some(id);
        self.buf.clear();
        Ok(())
    }

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError> {
        let Some(id) = self.id.clone() else {
            return Ok(());
        };
        match tag {
            MarkupEnd::Section => {
                let elements = match self.list {
                    WorldList::Locations => &mut novel.locations,
                    WorldList::Items => &mut novel.items,
                };
                if let Some(element) = elements.get_mut(&id) {
                    element.desc = Some(self.buf.take().trim_end().to_string());
                }
                self.id = None;
            }
            MarkupEnd::Paragraph | MarkupEnd::Blockquote => self.buf.end_trimmed_line(),
            _ => {}
        }
        Ok(())
    }

    fn handle_data(&mut self, _novel: &mut Novel, data: &str) -> Result<(), ConvertError> {
        if self.id.is_some() {
            self.buf.push(data);
        }
        Ok(())
    }
}
