use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use novelsync_backend::model::Novel;
use novelsync_backend::yw7::Yw7File;

/// Two chapters, three scenes, two characters, a location and an item.
/// Scene 1 carries a node the converter does not know.
pub const PROJECT_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<YWRITER7>
  <PROJECT>
    <Ver>7</Ver>
    <Title><![CDATA[The Night Train]]></Title>
    <AuthorName><![CDATA[Jo Quill]]></AuthorName>
    <Fields>
      <Field_LanguageCode>en</Field_LanguageCode>
      <Field_CountryCode>GB</Field_CountryCode>
    </Fields>
  </PROJECT>
  <LOCATIONS>
    <LOCATION><ID>1</ID><Title><![CDATA[Station]]></Title><Desc><![CDATA[Cold and empty.]]></Desc><SortOrder>1</SortOrder></LOCATION>
  </LOCATIONS>
  <ITEMS>
    <ITEM><ID>1</ID><Title><![CDATA[Ticket]]></Title><SortOrder>1</SortOrder></ITEM>
  </ITEMS>
  <CHARACTERS>
    <CHARACTER><ID>1</ID><Title><![CDATA[Ada]]></Title><Desc><![CDATA[The conductor.]]></Desc><SortOrder>1</SortOrder><Major>-1</Major></CHARACTER>
    <CHARACTER><ID>2</ID><Title><![CDATA[Ben]]></Title><SortOrder>2</SortOrder></CHARACTER>
  </CHARACTERS>
  <SCENES>
    <SCENE>
      <ID>1</ID>
      <Title><![CDATA[Boarding]]></Title>
      <Desc><![CDATA[Ada checks tickets.]]></Desc>
      <SceneContent><![CDATA[Ada walked along the platform.]]></SceneContent>
      <WordCount>5</WordCount>
      <LetterCount>26</LetterCount>
      <Status>3</Status>
      <Characters><CharID>1</CharID><CharID>9</CharID></Characters>
      <Locations><LocID>1</LocID></Locations>
      <SpecificDateTime>2024-01-05 10:20:00</SpecificDateTime>
      <SpecificDateMode>-1</SpecificDateMode>
      <Plotline flavor="noir">Keep me</Plotline>
    </SCENE>
    <SCENE>
      <ID>2</ID>
      <Title><![CDATA[Departure]]></Title>
      <SceneContent><![CDATA[The train left.]]></SceneContent>
      <Status>2</Status>
    </SCENE>
    <SCENE>
      <ID>3</ID>
      <Title><![CDATA[Research]]></Title>
      <SceneContent><![CDATA[Timetables of 1920.]]></SceneContent>
      <Unused>-1</Unused>
      <Fields><Field_SceneType>1</Field_SceneType></Fields>
    </SCENE>
  </SCENES>
  <CHAPTERS>
    <CHAPTER><ID>1</ID><Title><![CDATA[Chapter One]]></Title><SortOrder>1</SortOrder><Type>0</Type><ChapterType>0</ChapterType><Scenes><ScID>1</ScID><ScID>2</ScID></Scenes></CHAPTER>
    <CHAPTER><ID>2</ID><Title><![CDATA[Notes]]></Title><Unused>-1</Unused><SortOrder>2</SortOrder><Type>1</Type><ChapterType>1</ChapterType><Scenes><ScID>3</ScID></Scenes></CHAPTER>
  </CHAPTERS>
</YWRITER7>
"#;

#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[allow(dead_code)]
/// Write `PROJECT_XML` as `<dir>/<name>.yw7`.
pub fn write_project(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{}.yw7", name));
    fs::write(&path, PROJECT_XML).expect("Failed to write project");
    path
}

#[allow(dead_code)]
pub fn read_project(path: &Path) -> Novel {
    let mut novel = Novel::new();
    Yw7File::new(path).read(&mut novel).expect("Failed to read project");
    novel
}

fn write_zip(path: &Path, parts: &[(&str, &str)]) {
    let file = File::create(path).expect("Failed to create document");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        zip.start_file(*name, options).expect("Failed to start zip entry");
        zip.write_all(content.as_bytes()).expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish zip");
}

/// `content.xml` of a text document with the given body.
#[allow(dead_code)]
pub fn odt_content(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content office:version="1.2">
<office:automatic-styles>
<style:style style:name="T1" style:family="text"><style:text-properties style:font-style="italic"/></style:style>
<style:style style:name="T2" style:family="text"><style:text-properties fo:language="de" fo:country="CH"/></style:style>
</office:automatic-styles>
<office:body><office:text>{}</office:text></office:body>
</office:document-content>"#,
        body
    )
}

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles office:version="1.2">
<office:styles>
<style:default-style style:family="paragraph"><style:text-properties fo:language="en" fo:country="GB"/></style:default-style>
</office:styles>
</office:document-styles>"#;

fn meta_xml(title: &str, author: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta office:version="1.2">
<office:meta><dc:title>{}</dc:title><meta:initial-creator>{}</meta:initial-creator></office:meta>
</office:document-meta>"#,
        title, author
    )
}

/// A text document with styles and metadata.
#[allow(dead_code)]
pub fn write_odt(path: &Path, body: &str) {
    write_odt_with_meta(path, body, "The Night Train", "Jo Quill");
}

#[allow(dead_code)]
pub fn write_odt_with_meta(path: &Path, body: &str, title: &str, author: &str) {
    let content = odt_content(body);
    let meta = meta_xml(title, author);
    write_zip(
        path,
        &[
            ("mimetype", "application/vnd.oasis.opendocument.text"),
            ("content.xml", &content),
            ("styles.xml", STYLES_XML),
            ("meta.xml", &meta),
        ],
    );
}

fn cell(text: &str) -> String {
    if text.is_empty() {
        "<table:table-cell/>".to_string()
    } else {
        format!(r#"<table:table-cell office:value-type="string"><text:p>{}</text:p></table:table-cell>"#, text)
    }
}

/// A spreadsheet whose first table holds `rows`. Every row ends with a run of
/// repeated empty cells, as office suites write them.
#[allow(dead_code)]
pub fn write_ods(path: &Path, rows: &[Vec<&str>]) {
    write_sheet(path, rows, true);
}

/// Like `write_ods`, but rows end with their last given cell.
#[allow(dead_code)]
pub fn write_ods_unpadded(path: &Path, rows: &[Vec<&str>]) {
    write_sheet(path, rows, false);
}

fn write_sheet(path: &Path, rows: &[Vec<&str>], pad: bool) {
    let mut table = String::new();
    for row in rows {
        table.push_str("<table:table-row>");
        for text in row {
            table.push_str(&cell(text));
        }
        if pad {
            table.push_str(r#"<table:table-cell table:number-columns-repeated="1000"/>"#);
        }
        table.push_str("</table:table-row>");
    }
    let content = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content office:version="1.2"><office:body><office:spreadsheet><table:table table:name="List">{}</table:table></office:spreadsheet></office:body></office:document-content>"#,
        table
    );
    write_zip(
        path,
        &[("mimetype", "application/vnd.oasis.opendocument.spreadsheet"), ("content.xml", &content)],
    );
}
