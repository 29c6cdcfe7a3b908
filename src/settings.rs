use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{DEFAULT_CACHE_KEY, DEFAULT_MIN_VIABLE_DETAILS};
use crate::filter::{Criteria, SortOption, UnratedPlacement};
use crate::omdb::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "OMDB_API_KEY";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine config path")]
    NoConfigPath,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    #[serde(rename = "worst_of_80s_and_90s")]
    WorstOf80sAnd90s,
    FamilySafe,
    Browse,
}

impl Preset {
    pub fn criteria(self) -> Criteria {
        match self {
            Preset::WorstOf80sAnd90s => Criteria::worst_of_80s_and_90s(),
            Preset::FamilySafe => Criteria::family_safe(),
            Preset::Browse => Criteria::browse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_key: String,
    pub base_url: String,
    pub search_terms: Vec<String>,
    pub max_pages_per_term: u32,
    pub max_details: usize,
    pub cache_key: String,
    pub min_viable_details: usize,
    pub cache_dir: Option<PathBuf>,
    pub preset: Preset,
    pub language: Option<String>,
    pub topic: Option<String>,
    pub genre: Option<String>,
    pub max_runtime: Option<u32>,
    pub sort: Option<SortOption>,
    pub unrated: UnratedPlacement,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::from(DEFAULT_BASE_URL),
            search_terms: ["the", "and", "ing", "scream", "act", "man"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            max_pages_per_term: 10,
            max_details: 500,
            cache_key: String::from(DEFAULT_CACHE_KEY),
            min_viable_details: DEFAULT_MIN_VIABLE_DETAILS,
            cache_dir: None,
            preset: Preset::default(),
            language: None,
            topic: None,
            genre: None,
            max_runtime: None,
            sort: None,
            unrated: UnratedPlacement::default(),
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("moviesieve")
                .join("config.json")
        })
    }

    /// Reads the settings file, falling back to defaults when it is absent.
    /// The `OMDB_API_KEY` environment variable overrides the stored key.
    pub fn load() -> Result<Self, SettingsError> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_json(&std::fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_key = key.trim().to_string();
            }
        }
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigPath)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.search_terms.is_empty()
    }

    pub fn cache_directory(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(crate::cache::FileStore::default_directory)
    }

    /// The preset's criteria with the optional overrides applied on top.
    pub fn criteria(&self) -> Criteria {
        let mut criteria = self.preset.criteria();
        if let Some(language) = &self.language {
            criteria = criteria.with_language(language.clone());
        }
        if let Some(topic) = &self.topic {
            criteria = criteria.with_topic(topic.clone());
        }
        if let Some(genre) = &self.genre {
            criteria = criteria.with_genre(genre.clone());
        }
        if let Some(minutes) = self.max_runtime {
            criteria = criteria.with_max_runtime(minutes);
        }
        let sort_by = self.sort.unwrap_or(criteria.sort_by);
        criteria.with_sort(sort_by, self.unrated)
    }
}
