//! A small owned element tree, enough to merge into a project file while keeping
//! nodes and attributes the converter does not know about.

use anyhow::{anyhow, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        XmlElement {
            name: name.to_string(),
            ..XmlElement::default()
        }
    }

    pub fn with_text(name: &str, text: &str) -> Self {
        XmlElement {
            name: name.to_string(),
            text: Some(text.to_string()),
            ..XmlElement::default()
        }
    }

    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Text of the first child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|c| c.text.as_deref())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }

    /// All elements named `name` in document order, including `self`.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_descendants(name, found);
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    /// Insert at `index`, or append if `index` is past the end.
    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    pub fn push(&mut self, child: XmlElement) -> &mut XmlElement {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Remove the first child named `name`.
    pub fn remove(&mut self, name: &str) -> Option<XmlElement> {
        let index = self.position(name)?;
        Some(self.children.remove(index))
    }

    /// Remove all children named `name`, returning them in document order.
    pub fn remove_all(&mut self, name: &str) -> Vec<XmlElement> {
        let (removed, kept): (Vec<XmlElement>, Vec<XmlElement>) =
            std::mem::take(&mut self.children).into_iter().partition(|c| c.name == name);
        self.children = kept;
        removed
    }

    /// The first child named `name`, appended if missing. The flag tells whether
    /// it was created.
    pub fn child_or_append(&mut self, name: &str) -> (&mut XmlElement, bool) {
        match self.position(name) {
            Some(index) => (&mut self.children[index], false),
            None => (self.push(XmlElement::new(name)), true),
        }
    }

    /// Like `child_or_append`, but a missing child is inserted at `index`.
    pub fn child_or_insert(&mut self, name: &str, index: usize) -> (&mut XmlElement, bool) {
        match self.position(name) {
            Some(i) => (&mut self.children[i], false),
            None => {
                let index = index.min(self.children.len());
                self.children.insert(index, XmlElement::new(name));
                (&mut self.children[index], true)
            }
        }
    }
}

fn start_element(e: &BytesStart) -> Result<XmlElement> {
    let mut element = XmlElement::new(std::str::from_utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.to_string();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn append_text(element: &mut XmlElement, text: &str) {
    match element.text.as_mut() {
        Some(t) => t.push_str(text),
        None => element.text = Some(text.to_string()),
    }
}

fn close_element(mut element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) -> Result<()> {
    // Indentation between child elements is not content.
    if !element.children.is_empty() && element.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        element.text = None;
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(anyhow!("More than one root element"));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

/// Parse a complete document. CDATA sections become plain text, comments and
/// processing instructions are dropped.
pub fn parse_str(content: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => stack.push(start_element(e)?),
            Event::Empty(ref e) => {
                let element = start_element(e)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| anyhow!("Unexpected end tag"))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(ref e) => {
                if let Some(current) = stack.last_mut() {
                    append_text(current, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    let raw = e.into_inner();
                    append_text(current, &String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(anyhow!("Unclosed element: {}", stack[stack.len() - 1].name));
    }
    root.ok_or_else(|| anyhow!("No root element"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Serialize with two-space indentation and no declaration. All text is escaped.
pub fn to_xml_string(root: &XmlElement) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_element(&mut writer, root)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<YWRITER7>
  <PROJECT>
    <Title><![CDATA[Tom & Jerry]]></Title>
    <Custom flavor="salty">kept</Custom>
  </PROJECT>
  <SCENES>
    <SCENE><ID>1</ID></SCENE>
    <SCENE><ID>2</ID><Unused>-1</Unused></SCENE>
  </SCENES>
</YWRITER7>
"#;

    #[test]
    fn test_parse_and_find() {
        let root = parse_str(SAMPLE).unwrap();
        assert_eq!(root.name, "YWRITER7");
        assert_eq!(root.text, None);

        let prj = root.find("PROJECT").unwrap();
        assert_eq!(prj.child_text("Title"), Some("Tom & Jerry"));
        let custom = prj.find("Custom").unwrap();
        assert_eq!(custom.attributes, vec![("flavor".to_string(), "salty".to_string())]);

        let scenes = root.descendants("SCENE");
        assert_eq!(scenes.len(), 2);
        assert!(scenes[1].has_child("Unused"));
    }

    #[test]
    fn test_round_trip_keeps_unknown_nodes() {
        let root = parse_str(SAMPLE).unwrap();
        let text = to_xml_string(&root).unwrap();
        assert!(text.contains("<Custom flavor=\"salty\">kept</Custom>"), "got: {}", text);
        assert!(text.contains("Tom &amp; Jerry"));

        let again = parse_str(&text).unwrap();
        assert_eq!(again, root);
    }

    #[test]
    fn test_lookup_or_create() {
        let mut root = parse_str(SAMPLE).unwrap();
        let prj = root.find_mut("PROJECT").unwrap();

        let (_, created) = prj.child_or_append("Title");
        assert!(!created);

        let (ver, created) = prj.child_or_insert("Ver", 0);
        assert!(created);
        ver.set_text("7");
        assert_eq!(prj.children[0].name, "Ver");

        let scenes = root.find_mut("SCENES").unwrap();
        let removed = scenes.remove_all("SCENE");
        assert_eq!(removed.len(), 2);
        assert!(scenes.children.is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_str("<A><B></A>").is_err());
        assert!(parse_str("<A>").is_err());
        assert!(parse_str("").is_err());
    }
}
