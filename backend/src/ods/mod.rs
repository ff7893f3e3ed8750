//! Spreadsheet documents (`.ods`) merged into a [`Novel`].

mod lists;
pub mod parser;

use std::path::PathBuf;

use crate::logger::error;
use crate::model::Novel;
use crate::types::{ConvertError, norm_path};

pub const EXTENSION: &str = ".ods";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdsKind {
    SceneList,
    CharList,
    LocList,
    ItemList,
}

impl OdsKind {
    pub const ALL: [OdsKind; 4] = [OdsKind::CharList, OdsKind::LocList, OdsKind::ItemList, OdsKind::SceneList];

    pub fn suffix(&self) -> &'static str {
        match self {
            OdsKind::SceneList => "_scenelist",
            OdsKind::CharList => "_charlist",
            OdsKind::LocList => "_loclist",
            OdsKind::ItemList => "_itemlist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OdsKind::SceneList => "Scene list",
            OdsKind::CharList => "Character list",
            OdsKind::LocList => "Location list",
            OdsKind::ItemList => "Item list",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            OdsKind::SceneList => &lists::SCENE_LIST_COLUMNS,
            OdsKind::CharList => &lists::CHAR_LIST_COLUMNS,
            OdsKind::LocList | OdsKind::ItemList => &lists::WORLD_LIST_COLUMNS,
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<OdsKind> {
        OdsKind::ALL
            .into_iter()
            .find(|kind| file_name.ends_with(&format!("{}{}", kind.suffix(), EXTENSION)))
    }
}

#[derive(Debug, Clone)]
pub struct OdsReader {
    pub kind: OdsKind,
    pub file_path: PathBuf,
}

impl OdsReader {
    pub fn new(kind: OdsKind, file_path: impl Into<PathBuf>) -> Self {
        OdsReader {
            kind,
            file_path: file_path.into(),
        }
    }

    /// Merge the list into `novel`. Every row must have the list's column count.
    pub fn read(&self, novel: &mut Novel) -> Result<(), ConvertError> {
        let cells_per_row = self.kind.columns().len();
        let rows = parser::get_rows(&self.file_path, cells_per_row)?;

        if let Some(row) = rows.iter().find(|r| r.len() != cells_per_row) {
            error(&format!(
                "{}: row {:?} has {} of {} cells",
                norm_path(&self.file_path),
                row.first(),
                row.len(),
                cells_per_row
            ));
            return Err(ConvertError::MalformedTable(norm_path(&self.file_path)));
        }
        tracing::info!("Reading {} rows from {}", rows.len(), norm_path(&self.file_path));

        match self.kind {
            OdsKind::SceneList => lists::merge_scene_list(novel, &rows),
            OdsKind::CharList => lists::merge_char_list(novel, &rows),
            OdsKind::LocList => lists::merge_loc_list(novel, &rows),
            OdsKind::ItemList => lists::merge_item_list(novel, &rows),
        }
        Ok(())
    }
}
