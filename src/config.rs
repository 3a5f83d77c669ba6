use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

const STRINGS_FILE: &str = "strings";
const TERM_OFFSETS_FILE: &str = "term_string_offsets";
const LINK_HASHES_FILE: &str = "string_offsets_link_hashes";

/// Default delimiter set: ASCII whitespace plus common punctuation
pub const DEFAULT_DELIMITERS: &str = " \t\n\r\x0b\x0c,.;:!?()[]{}<>\"'";

/// String store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory holding the three store files
    pub path: PathBuf,
    /// Strings of this many bytes or more are stored but never indexed
    pub max_searchable_string_size: usize,
    /// Extension shared by all store files
    pub file_extension: String,
    pub tokenizer: TokenizerConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/strings"),
            max_searchable_string_size: 1000,
            file_extension: "scdb".to_string(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}

/// How strings are split into terms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
    /// Split on any character in `TokenizerConfig::delimiters`
    Delimiters,
    /// Unicode word boundaries (UAX #29)
    UnicodeWords,
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub mode: TokenizerMode,
    pub delimiters: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            mode: TokenizerMode::Delimiters,
            delimiters: DEFAULT_DELIMITERS.to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a configuration rooted at `path` with default settings
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| StoreError::read(format!("config {}", path.display()), e))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the indexable-string cutoff
    pub fn with_max_searchable_string_size(mut self, size: usize) -> Self {
        self.max_searchable_string_size = size;
        self
    }

    pub fn with_file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = ext.into();
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_searchable_string_size == 0 {
            return Err(StoreError::InvalidConfig(
                "max_searchable_string_size must be positive".to_string(),
            ));
        }
        if self.tokenizer.mode == TokenizerMode::Delimiters && self.tokenizer.delimiters.is_empty()
        {
            return Err(StoreError::InvalidConfig(
                "delimiter tokenizer needs at least one delimiter".to_string(),
            ));
        }
        Ok(())
    }

    fn file_path(&self, stem: &str) -> PathBuf {
        if self.file_extension.is_empty() {
            self.path.join(stem)
        } else {
            self.path.join(format!("{}.{}", stem, self.file_extension))
        }
    }

    /// Append-only content log
    pub fn strings_path(&self) -> PathBuf {
        self.file_path(STRINGS_FILE)
    }

    /// Term index file
    pub fn term_offsets_path(&self) -> PathBuf {
        self.file_path(TERM_OFFSETS_FILE)
    }

    /// Link index file
    pub fn link_hashes_path(&self) -> PathBuf {
        self.file_path(LINK_HASHES_FILE)
    }
}
