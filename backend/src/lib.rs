pub mod types;
pub mod ui;
pub mod helpers;
pub mod logger;
pub mod app_settings;
pub mod model;
pub mod xml_tree;
pub mod odf;
pub mod yw7;
pub mod odt;
pub mod ods;
pub mod splitter;
pub mod converter;

use std::env;
use std::error::Error;
use std::fs::create_dir_all;
use std::path::PathBuf;
use app_dirs::{get_app_root, AppDataType, AppInfo};

pub const APP_INFO: AppInfo = AppInfo{name: "novelsync", author: "novelsync"};

/// Directory for the log file and settings. `NOVELSYNC_DIR` overrides the
/// platform data directory.
pub fn get_create_novelsync_dir() -> Result<PathBuf, Box<dyn Error>> {
    let p = match env::var("NOVELSYNC_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => get_app_root(AppDataType::UserData, &APP_INFO)?,
    };
    if !p.exists() {
        create_dir_all(&p)?;
    }
    Ok(p)
}
