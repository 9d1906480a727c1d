//! Configuration loading for the retrieval-augmented conversation core.
//!
//! Configuration lives at `$HOME/.rag-terminal/config.yaml` and is created
//! with defaults on first run, mirroring how the teacher crate resolves its
//! own prompt directory via `dirs`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Token budget allocation for one content modality (prose or code).
///
/// `input_ratio` is the share of the context window reserved for input
/// (the remainder is reserved for model output). `excerpts` and `history`
/// are shares of the resulting input budget; the file-list budget is a
/// fixed 100 tokens and chunks get whatever remains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TokenBudgetProfile {
    /// Share of the context window reserved for input tokens.
    pub input_ratio: f64,
    /// Share of the input budget spent on relevant-information excerpts.
    pub excerpts: f64,
    /// Share of the input budget spent on conversation history.
    pub history: f64,
}

impl TokenBudgetProfile {
    /// Validates the profile's ratios are well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if any ratio is outside `[0, 1]` or
    /// if `excerpts + history` exceeds `1.0`.
    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.input_ratio) || !in_range(self.excerpts) || !in_range(self.history) {
            return Err(Error::ConfigInvalid {
                message: "token budget ratios must be within [0, 1]".to_string(),
            });
        }
        if self.excerpts + self.history > 1.0 {
            return Err(Error::ConfigInvalid {
                message: "excerpts + history ratios must not exceed 1.0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TokenBudgetProfile {
    fn default() -> Self {
        Self {
            input_ratio: 0.6,
            excerpts: 0.3,
            history: 0.1,
        }
    }
}

fn default_code_budget() -> TokenBudgetProfile {
    TokenBudgetProfile {
        input_ratio: 0.7,
        excerpts: 0.15,
        history: 0.05,
    }
}

fn default_embedding_dimensions() -> usize {
    786
}

/// Top-level configuration for the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Token budget profile applied to prose-dominant turns.
    #[serde(default)]
    pub token_budget: TokenBudgetProfile,
    /// Token budget profile applied to code-dominant turns.
    #[serde(default = "default_code_budget")]
    pub code_token_budget: TokenBudgetProfile,
    /// Dimensionality expected of embedding vectors produced by `Inference`.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_budget: TokenBudgetProfile::default(),
            code_token_budget: default_code_budget(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

impl Config {
    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if any nested profile is invalid or
    /// `embedding_dimensions` is zero.
    pub fn validate(&self) -> Result<()> {
        self.token_budget.validate()?;
        self.code_token_budget.validate()?;
        if self.embedding_dimensions == 0 {
            return Err(Error::ConfigInvalid {
                message: "embedding_dimensions must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the default configuration directory, `$HOME/.rag-terminal`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the home directory cannot be
    /// resolved.
    pub fn default_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".rag-terminal"))
            .ok_or_else(|| Error::ConfigInvalid {
                message: "could not resolve home directory".to_string(),
            })
    }

    fn default_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join("config.yaml"))
    }

    /// Loads configuration from `$HOME/.rag-terminal/config.yaml`, writing
    /// defaults to that path first if it does not yet exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the file cannot
    /// be read or written, or its contents fail to parse or validate.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            let defaults = Self::default();
            defaults.write_to(&path)?;
            return Ok(defaults);
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to parse, or
    /// fails validation.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|e| Error::ConfigInvalid {
            message: format!("failed to parse {}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn write_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| Error::ConfigInvalid {
            message: format!("failed to serialize default config: {e}"),
        })?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles_validate() {
        Config::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let profile = TokenBudgetProfile {
            input_ratio: 1.5,
            excerpts: 0.2,
            history: 0.1,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_excerpts_plus_history_over_budget_rejected() {
        let profile = TokenBudgetProfile {
            input_ratio: 0.6,
            excerpts: 0.8,
            history: 0.5,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut config = Config::default();
        config.embedding_dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_defaults_on_first_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        assert!(!path.exists());
        let defaults = Config::default();
        defaults.write_to(&path).expect("write defaults");
        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, defaults);
    }

    #[test]
    fn test_load_from_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "not: [valid, yaml: structure").expect("write");
        assert!(Config::load_from(&path).is_err());
    }
}
