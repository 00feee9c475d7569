// Language → backend id mapping, with optional overrides from languages.json
use anyhow::{bail, Context, Result};
use arbiter_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Language used when a request names something we cannot map
pub const DEFAULT_LANGUAGE: Language = Language::Python;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub backend_id: u32,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageConfig>,
}

/// Result of resolving a user-supplied language identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLanguage {
    pub language: Language,
    pub backend_id: u32,
    /// The requested identifier was not recognised and the default was used
    pub defaulted: bool,
}

#[derive(Debug, Clone)]
pub struct LanguageConfigManager {
    ids: HashMap<Language, u32>,
}

impl Default for LanguageConfigManager {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageConfigManager {
    /// Judge0 CE ids for every known language
    pub fn builtin() -> Self {
        let ids = Language::ALL
            .iter()
            .map(|lang| (*lang, lang.default_backend_id()))
            .collect();
        Self { ids }
    }

    /// Load overrides from a languages.json file on top of the built-in table
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Language config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path).context("Failed to read languages.json")?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let languages_json: LanguagesJson =
            serde_json::from_str(content).context("Failed to parse languages.json")?;

        let mut manager = Self::builtin();
        for entry in languages_json.languages {
            let Some(language) = Language::from_name(&entry.name) else {
                bail!("Unknown language '{}' in languages.json", entry.name);
            };
            debug!(language = %language, backend_id = entry.backend_id, "Language id override");
            manager.ids.insert(language, entry.backend_id);
        }
        Ok(manager)
    }

    /// Load from `path` when given, else the built-in table
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn backend_id(&self, language: Language) -> u32 {
        self.ids
            .get(&language)
            .copied()
            .unwrap_or_else(|| language.default_backend_id())
    }

    /// Resolve a language identifier, degrading to the default language instead of failing
    pub fn resolve(&self, requested: &str) -> ResolvedLanguage {
        match Language::from_name(requested) {
            Some(language) => ResolvedLanguage {
                language,
                backend_id: self.backend_id(language),
                defaulted: false,
            },
            None => {
                warn!(
                    requested = requested,
                    fallback = %DEFAULT_LANGUAGE,
                    "Unrecognised language, using default"
                );
                ResolvedLanguage {
                    language: DEFAULT_LANGUAGE,
                    backend_id: self.backend_id(DEFAULT_LANGUAGE),
                    defaulted: true,
                }
            }
        }
    }

    pub fn list_languages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ids.keys().map(|l| l.to_string()).collect();
        names.sort();
        names
    }
}
