//! segtext configuration management.

use anyhow::Result;
use segmenter::{FlushPolicy, SplitOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegtextConfig {
    /// Preferred segment length
    #[serde(default = "default_target_length")]
    pub target_length: usize,

    /// Hard upper bound for segment length
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Lower bound for non-terminal segments
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Uniformity tolerance around the target
    #[serde(default = "default_tolerance")]
    pub tolerance: usize,

    /// Seek punctuation when hard splits are unavoidable
    #[serde(default = "default_prefer_sentence_boundary")]
    pub prefer_sentence_boundary: bool,
}

fn default_target_length() -> usize {
    segmenter::splitter::DEFAULT_TARGET_LENGTH
}

fn default_max_length() -> usize {
    segmenter::splitter::DEFAULT_MAX_LENGTH
}

fn default_min_length() -> usize {
    segmenter::splitter::DEFAULT_MIN_LENGTH
}

fn default_tolerance() -> usize {
    segmenter::splitter::DEFAULT_TOLERANCE
}

fn default_prefer_sentence_boundary() -> bool {
    true
}

impl Default for SegtextConfig {
    fn default() -> Self {
        Self {
            target_length: default_target_length(),
            max_length: default_max_length(),
            min_length: default_min_length(),
            tolerance: default_tolerance(),
            prefer_sentence_boundary: default_prefer_sentence_boundary(),
        }
    }
}

impl SegtextConfig {
    /// Get the config file path: ~/.config/cli-programs/segtext.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("segtext.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: SegtextConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Turn the stored defaults into splitter options.
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            target_length: self.target_length,
            max_length: self.max_length,
            min_length: self.min_length,
            tolerance: self.tolerance,
            prefer_sentence_boundary: self.prefer_sentence_boundary,
            flush_policy: FlushPolicy::default(),
        }
    }
}
