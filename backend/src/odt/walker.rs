//! Event-driven traversal of an ODF text document.
//!
//! The walker resolves the document's styles into a small tag vocabulary and
//! calls a [`MarkupHandler`] for every start tag, end tag, text run and
//! annotation. It builds no entities itself.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::Novel;
use crate::odf;
use crate::types::ConvertError;
use crate::xml_tree::{self, XmlElement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Author,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupTag {
    /// Default paragraph locale of the document.
    Body { language: Option<String>, country: Option<String> },
    /// Document title from the metadata, followed by its text and an end tag.
    Title,
    Meta { field: MetaField, content: String },
    Heading(u8),
    Paragraph { lang: Option<String> },
    Blockquote { lang: Option<String> },
    ListItem,
    Emphasis,
    Strong,
    Lang(String),
    Section(String),
}

/// End tags. A list item ends with `Paragraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupEnd {
    Title,
    Heading(u8),
    Paragraph,
    Blockquote,
    Emphasis,
    Strong,
    Lang,
    Section,
}

pub trait MarkupHandler {
    fn handle_starttag(&mut self, novel: &mut Novel, tag: &MarkupTag) -> Result<(), ConvertError>;

    fn handle_endtag(&mut self, novel: &mut Novel, tag: MarkupEnd) -> Result<(), ConvertError>;

    fn handle_data(&mut self, novel: &mut Novel, data: &str) -> Result<(), ConvertError>;

    /// Text of the first paragraph of an annotation.
    fn handle_comment(&mut self, _novel: &mut Novel, _data: &str) -> Result<(), ConvertError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Emphasis,
    Strong,
    Lang,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphKind {
    Paragraph,
    Blockquote,
    Heading(u8),
    /// Paragraph inside an annotation.
    Comment,
    /// Paragraph inside another paragraph (footnote, frame): inherits the outer one.
    Nested,
}

#[derive(Debug)]
struct StyleTable {
    em_styles: HashSet<String>,
    strong_styles: HashSet<String>,
    blockquote_styles: HashSet<String>,
    language_styles: HashMap<String, String>,
    heading_styles: HashMap<String, u8>,
}

impl Default for StyleTable {
    fn default() -> Self {
        StyleTable {
            em_styles: HashSet::from(["Emphasis".to_string()]),
            strong_styles: HashSet::from(["Strong_20_Emphasis".to_string()]),
            blockquote_styles: HashSet::from(["Quotations".to_string()]),
            language_styles: HashMap::new(),
            heading_styles: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct CommentBuffer {
    paragraph_count: usize,
    text: String,
}

/// Walker state for one `content.xml`.
#[derive(Debug, Default)]
struct ContentWalker {
    styles: StyleTable,
    current_style: Option<String>,
    paragraphs: Vec<ParagraphKind>,
    spans: Vec<SpanKind>,
    list_depth: usize,
    comment: Option<CommentBuffer>,
}

/// "Heading_20_2" is level 2.
fn heading_level(style: &str) -> Option<u8> {
    style
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .filter(|d| *d > 0)
        .map(|d| d as u8)
}

fn attributes(e: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attrs.insert(key, value);
    }
    attrs
}

impl ContentWalker {
    fn start_element(
        &mut self,
        name: &str,
        attrs: &HashMap<String, String>,
        handler: &mut dyn MarkupHandler,
        novel: &mut Novel,
    ) -> Result<(), ConvertError> {
        let style = attrs.get("text:style-name").map(|s| s.as_str()).unwrap_or("");

        match name {
            "text:p" => {
                if let Some(comment) = self.comment.as_mut() {
                    comment.paragraph_count += 1;
                    self.paragraphs.push(ParagraphKind::Comment);
                    return Ok(());
                }
                if !self.paragraphs.is_empty() {
                    self.paragraphs.push(ParagraphKind::Nested);
                    return Ok(());
                }

                let lang = self.styles.language_styles.get(style).cloned();
                let style_heading = if style.starts_with("Heading") {
                    heading_level(style)
                } else {
                    self.styles.heading_styles.get(style).copied()
                };

                if self.styles.blockquote_styles.contains(style) {
                    handler.handle_starttag(novel, &MarkupTag::Blockquote { lang })?;
                    self.paragraphs.push(ParagraphKind::Blockquote);
                } else if let Some(level) = style_heading {
                    handler.handle_starttag(novel, &MarkupTag::Heading(level))?;
                    self.paragraphs.push(ParagraphKind::Heading(level));
                } else if self.list_depth > 0 {
                    handler.handle_starttag(novel, &MarkupTag::ListItem)?;
                    self.paragraphs.push(ParagraphKind::Paragraph);
                } else {
                    handler.handle_starttag(novel, &MarkupTag::Paragraph { lang })?;
                    self.paragraphs.push(ParagraphKind::Paragraph);
                }
            }
            "text:h" => {
                if self.comment.is_some() {
                    self.paragraphs.push(ParagraphKind::Comment);
                    return Ok(());
                }
                if !self.paragraphs.is_empty() {
                    self.paragraphs.push(ParagraphKind::Nested);
                    return Ok(());
                }
                let level = attrs
                    .get("text:outline-level")
                    .and_then(|l| l.trim().parse::<u8>().ok())
                    .or_else(|| heading_level(style))
                    .unwrap_or(1);
                handler.handle_starttag(novel, &MarkupTag::Heading(level))?;
                self.paragraphs.push(ParagraphKind::Heading(level));
            }
            "text:span" => {
                let kind = if self.comment.is_some() {
                    SpanKind::Plain
                } else if self.styles.em_styles.contains(style) {
                    handler.handle_starttag(novel, &MarkupTag::Emphasis)?;
                    SpanKind::Emphasis
                } else if self.styles.strong_styles.contains(style) {
                    handler.handle_starttag(novel, &MarkupTag::Strong)?;
                    SpanKind::Strong
                } else if let Some(locale) = self.styles.language_styles.get(style) {
                    handler.handle_starttag(novel, &MarkupTag::Lang(locale.clone()))?;
                    SpanKind::Lang
                } else {
                    SpanKind::Plain
                };
                self.spans.push(kind);
            }
            "text:section" => {
                let section_name = attrs.get("text:name").cloned().unwrap_or_default();
                handler.handle_starttag(novel, &MarkupTag::Section(section_name))?;
            }
            "office:annotation" => {
                self.comment = Some(CommentBuffer::default());
            }
            "text:list-item" => {
                self.list_depth += 1;
            }
            "text:s" => {
                let count = attrs
                    .get("text:c")
                    .and_then(|c| c.parse::<usize>().ok())
                    .unwrap_or(1);
                self.characters(&" ".repeat(count), handler, novel)?;
            }
            "style:style" => {
                let style_name = attrs.get("style:name").cloned();
                let parent = attrs.get("style:parent-style-name").map(|s| s.as_str()).unwrap_or("");
                if let Some(style_name) = &style_name {
                    if parent.starts_with("Heading") {
                        if let Some(level) = heading_level(parent) {
                            self.styles.heading_styles.insert(style_name.clone(), level);
                        }
                    } else if parent == "Quotations" {
                        self.styles.blockquote_styles.insert(style_name.clone());
                    }
                }
                self.current_style = style_name;
            }
            "style:text-properties" => {
                let Some(style_name) = self.current_style.clone() else {
                    return Ok(());
                };
                if attrs.get("style:font-style").map(|s| s.as_str()) == Some("italic") {
                    self.styles.em_styles.insert(style_name.clone());
                }
                if attrs.get("style:font-weight").map(|s| s.as_str()) == Some("bold") {
                    self.styles.strong_styles.insert(style_name.clone());
                }
                if let Some(language) = attrs.get("fo:language").filter(|l| !l.is_empty()) {
                    let locale = match attrs.get("fo:country").map(|c| c.as_str()) {
                        Some(country) if country != "none" && !country.is_empty() => {
                            format!("{}-{}", language, country)
                        }
                        _ => language.clone(),
                    };
                    self.styles.language_styles.insert(style_name, locale);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
        match name {
            "text:p" | "text:h" => match self.paragraphs.pop() {
                Some(ParagraphKind::Blockquote) => handler.handle_endtag(novel, MarkupEnd::Blockquote)?,
                Some(ParagraphKind::Heading(level)) => handler.handle_endtag(novel, MarkupEnd::Heading(level))?,
                Some(ParagraphKind::Paragraph) => handler.handle_endtag(novel, MarkupEnd::Paragraph)?,
                _ => {}
            },
            "text:span" => match self.spans.pop() {
                Some(SpanKind::Emphasis) => handler.handle_endtag(novel, MarkupEnd::Emphasis)?,
                Some(SpanKind::Strong) => handler.handle_endtag(novel, MarkupEnd::Strong)?,
                Some(SpanKind::Lang) => handler.handle_endtag(novel, MarkupEnd::Lang)?,
                _ => {}
            },
            "text:section" => handler.handle_endtag(novel, MarkupEnd::Section)?,
            "office:annotation" => {
                if let Some(comment) = self.comment.take() {
                    handler.handle_comment(novel, &comment.text)?;
                }
            }
            "text:list-item" => {
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            "style:style" => {
                self.current_style = None;
            }
            _ => {}
        }
        Ok(())
    }

    fn characters(&mut self, content: &str, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
        if let Some(comment) = self.comment.as_mut() {
            if comment.paragraph_count == 1 {
                comment.text.push_str(content);
            }
        } else if !self.paragraphs.is_empty() {
            handler.handle_data(novel, content)?;
        }
        Ok(())
    }

    fn walk(&mut self, path: &Path, content: &str, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
        let malformed = |e: quick_xml::Error| ConvertError::malformed_document(path, &e.to_string());

        let mut reader = Reader::from_str(content);
        reader.trim_text(false);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(malformed)? {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.start_element(&name, &attributes(e), handler, novel)?;
                }
                Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.start_element(&name, &attributes(e), handler, novel)?;
                    self.end_element(&name, handler, novel)?;
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.end_element(&name, handler, novel)?;
                }
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(malformed)?;
                    self.characters(&text, handler, novel)?;
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    self.characters(&String::from_utf8_lossy(&raw), handler, novel)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }
}

/// Default paragraph locale from `styles.xml`.
fn default_locale(styles: &XmlElement) -> Option<(Option<String>, Option<String>)> {
    let office_styles = styles.find("office:styles")?;
    let default_style = office_styles
        .find_all("style:default-style")
        .find(|s| s.attribute("style:family") == Some("paragraph"))?;
    let properties = default_style.find("style:text-properties");
    Some((
        properties.and_then(|p| p.attribute("fo:language")).map(|s| s.to_string()),
        properties.and_then(|p| p.attribute("fo:country")).map(|s| s.to_string()),
    ))
}

fn walk_styles(path: &Path, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
    let Some(styles) = odf::read_optional_part(path, "styles.xml")? else {
        return Ok(());
    };
    let root = xml_tree::parse_str(&styles).map_err(|e| ConvertError::malformed_document(path, &e.to_string()))?;
    if let Some((language, country)) = default_locale(&root) {
        handler.handle_starttag(novel, &MarkupTag::Body { language, country })?;
    }
    Ok(())
}

fn walk_meta(path: &Path, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
    let Some(meta) = odf::read_optional_part(path, "meta.xml")? else {
        return Ok(());
    };
    let root = xml_tree::parse_str(&meta).map_err(|e| ConvertError::malformed_document(path, &e.to_string()))?;
    let Some(office_meta) = root.find("office:meta") else {
        return Ok(());
    };

    if let Some(title) = office_meta.child_text("dc:title").filter(|t| !t.is_empty()) {
        handler.handle_starttag(novel, &MarkupTag::Title)?;
        handler.handle_data(novel, title)?;
        handler.handle_endtag(novel, MarkupEnd::Title)?;
    }
    if let Some(author) = office_meta.child_text("meta:initial-creator").filter(|t| !t.is_empty()) {
        let tag = MarkupTag::Meta { field: MetaField::Author, content: author.to_string() };
        handler.handle_starttag(novel, &tag)?;
    }
    if let Some(desc) = office_meta.child_text("dc:description").filter(|t| !t.is_empty()) {
        let tag = MarkupTag::Meta { field: MetaField::Description, content: desc.to_string() };
        handler.handle_starttag(novel, &tag)?;
    }
    Ok(())
}

/// Walk an `.odt` file: default locale, metadata, then the document body.
pub fn walk_document(path: &Path, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
    let content = odf::read_part(path, "content.xml")?;
    walk_styles(path, handler, novel)?;
    walk_meta(path, handler, novel)?;
    ContentWalker::default().walk(path, &content, handler, novel)
}

/// Walk a `content.xml` document directly.
pub fn walk_content(path: &Path, content: &str, handler: &mut dyn MarkupHandler, novel: &mut Novel) -> Result<(), ConvertError> {
    ContentWalker::default().walk(path, content, handler, novel)
}
