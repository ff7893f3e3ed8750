use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Serialize, Deserialize};

/// Tunables of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Used when a project has no language code.
    pub fallback_language_code: String,
    pub fallback_country_code: String,
    /// Imported scenes with fewer words get the Outline status, others Draft.
    pub low_word_count: usize,
    /// Parent title length kept in the title of a split-off scene.
    pub split_title_clip: usize,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        ConvertSettings {
            fallback_language_code: "en".to_string(),
            fallback_country_code: "US".to_string(),
            low_word_count: 10,
            split_title_clip: 20,
        }
    }
}

impl ConvertSettings {
    pub fn load_from_json(path: &Path) -> Result<Self> {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open settings: {}", path.display()))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;

        let settings: ConvertSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings JSON: {}", path.display()))?;

        Ok(settings)
    }

    /// Replace the fallback locale, e.g. from command line options.
    pub fn with_locale(mut self, language: Option<String>, country: Option<String>) -> Self {
        if let Some(l) = language {
            self.fallback_language_code = l;
        }
        if let Some(c) = country {
            self.fallback_country_code = c;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(br#"{ "fallback_language_code": "de", "fallback_country_code": "DE" }"#).unwrap();

        let settings = ConvertSettings::load_from_json(&path).unwrap();
        assert_eq!(settings.fallback_language_code, "de");
        assert_eq!(settings.low_word_count, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConvertSettings::load_from_json(Path::new("does/not/exist.json"));
        assert!(result.is_err());
    }
}
