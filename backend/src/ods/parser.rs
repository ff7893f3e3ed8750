use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::logger::error;
use crate::odf;
use crate::types::{ConvertError, norm_path};

fn attribute(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[derive(Debug, Default)]
struct Cell {
    paragraphs: Vec<String>,
    repeat: usize,
}

#[derive(Debug, Default)]
struct Row {
    cells: Vec<String>,
    /// An empty first cell or the expected cell count was reached.
    done: bool,
}

impl Row {
    fn add_cell(&mut self, cell: Cell, cells_per_row: usize) {
        if self.done {
            return;
        }
        let content = cell.paragraphs.join("\n");
        if self.cells.is_empty() && content.is_empty() {
            self.done = true;
            return;
        }
        for _ in 0..cell.repeat.max(1) {
            if self.cells.len() >= cells_per_row {
                break;
            }
            self.cells.push(content.clone());
        }
        if self.cells.len() >= cells_per_row {
            self.done = true;
        }
    }
}

/// Rows of the first table in a spreadsheet `content.xml`. Each row has at
/// most `cells_per_row` cells and ends at an empty first cell; empty rows are
/// dropped.
pub fn parse_rows(path: &Path, content: &str, cells_per_row: usize) -> Result<Vec<Vec<String>>, ConvertError> {
    let malformed = |e: quick_xml::Error| {
        error(&format!("{}: {}", norm_path(path), e));
        ConvertError::MalformedTable(norm_path(path))
    };

    let mut reader = Reader::from_str(content);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut tables_seen = 0;
    let mut in_table = false;
    let mut row: Option<Row> = None;
    let mut cell: Option<Cell> = None;
    let mut paragraph: Option<String> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(malformed)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"table:table" => {
                        tables_seen += 1;
                        in_table = tables_seen == 1 && !is_empty;
                    }
                    b"table:table-row" if in_table => {
                        row = Some(Row::default());
                        if is_empty {
                            row = None;
                        }
                    }
                    b"table:table-cell" if in_table && row.is_some() => {
                        let repeat = attribute(e, "table:number-columns-repeated")
                            .and_then(|r| r.parse::<usize>().ok())
                            .unwrap_or(1);
                        let new_cell = Cell { paragraphs: Vec::new(), repeat };
                        if is_empty {
                            if let Some(row) = row.as_mut() {
                                row.add_cell(new_cell, cells_per_row);
                            }
                        } else {
                            cell = Some(new_cell);
                        }
                    }
                    b"text:p" if cell.is_some() => {
                        if is_empty {
                            if let Some(cell) = cell.as_mut() {
                                cell.paragraphs.push(String::new());
                            }
                        } else {
                            paragraph = Some(String::new());
                        }
                    }
                    b"text:s" => {
                        if let Some(p) = paragraph.as_mut() {
                            let count = attribute(e, "text:c").and_then(|c| c.parse::<usize>().ok()).unwrap_or(1);
                            p.push_str(&" ".repeat(count));
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"table:table" => in_table = false,
                b"table:table-row" => {
                    if let Some(row) = row.take() {
                        if !row.cells.is_empty() {
                            rows.push(row.cells);
                        }
                    }
                }
                b"table:table-cell" => {
                    if let (Some(done), Some(row)) = (cell.take(), row.as_mut()) {
                        row.add_cell(done, cells_per_row);
                    }
                }
                b"text:p" => {
                    if let (Some(text), Some(cell)) = (paragraph.take(), cell.as_mut()) {
                        cell.paragraphs.push(text);
                    }
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if let Some(p) = paragraph.as_mut() {
                    p.push_str(&e.unescape().map_err(malformed)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// Read the rows of an `.ods` file, see [`parse_rows`].
pub fn get_rows(path: &Path, cells_per_row: usize) -> Result<Vec<Vec<String>>, ConvertError> {
    let content = odf::read_part(path, "content.xml")?;
    parse_rows(path, &content, cells_per_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content><office:body><office:spreadsheet><table:table table:name="Sheet1">{}</table:table><table:table table:name="Other"><table:table-row><table:table-cell><text:p>ignored</text:p></table:table-cell></table:table-row></table:table></office:spreadsheet></office:body></office:document-content>"#,
            rows
        )
    }

    #[test]
    fn test_rows_of_first_table() {
        let content = sheet(
            r#"<table:table-row><table:table-cell><text:p>ID</text:p></table:table-cell><table:table-cell><text:p>Name</text:p></table:table-cell><table:table-cell><text:p>Desc</text:p></table:table-cell></table:table-row>
<table:table-row><table:table-cell><text:p>LcID:1</text:p></table:table-cell><table:table-cell><text:p>Inn <text:span>by the</text:span><text:s text:c="2"/>road</text:p></table:table-cell><table:table-cell><text:p>Line 1</text:p><text:p>Line 2</text:p></table:table-cell><table:table-cell table:number-columns-repeated="1020"/></table:table-row>
<table:table-row><table:table-cell/><table:table-cell><text:p>orphan</text:p></table:table-cell></table:table-row>"#,
        );
        let rows = parse_rows(Path::new("x.ods"), &content, 3).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["ID".to_string(), "Name".to_string(), "Desc".to_string()],
                vec!["LcID:1".to_string(), "Inn by the  road".to_string(), "Line 1\nLine 2".to_string()],
            ]
        );
    }

    #[test]
    fn test_repeated_cells_fill_up_to_count() {
        let content = sheet(
            r#"<table:table-row><table:table-cell><text:p>ItID:2</text:p></table:table-cell><table:table-cell table:number-columns-repeated="2"><text:p>x</text:p></table:table-cell><table:table-cell table:number-columns-repeated="8"/></table:table-row>"#,
        );
        let rows = parse_rows(Path::new("x.ods"), &content, 5).unwrap();
        assert_eq!(rows, vec![vec!["ItID:2", "x", "x", "", ""]]);
    }

    #[test]
    fn test_short_row_stays_short() {
        let content = sheet(r#"<table:table-row><table:table-cell><text:p>CrID:1</text:p></table:table-cell></table:table-row>"#);
        let rows = parse_rows(Path::new("x.ods"), &content, 10).unwrap();
        assert_eq!(rows, vec![vec!["CrID:1"]]);
    }
}
