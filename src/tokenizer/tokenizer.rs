use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{TokenizerConfig, TokenizerMode};

/// Splits string content into terms for indexing and querying
///
/// Terms keep their original case; empty fragments between adjacent
/// delimiters are dropped.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    mode: TokenizerMode,
    delimiters: HashSet<char>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            mode: config.mode,
            delimiters: config.delimiters.chars().collect(),
        }
    }

    /// Tokenize text into ordered terms
    pub fn split(&self, text: &str) -> Vec<String> {
        self.terms(text).map(str::to_string).collect()
    }

    /// First term of `text`, if it has any
    pub fn first_term(&self, text: &str) -> Option<String> {
        self.terms(text).next().map(str::to_string)
    }

    fn terms<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.mode {
            TokenizerMode::Delimiters => Box::new(
                text.split(move |c: char| self.delimiters.contains(&c))
                    .filter(|term| !term.is_empty()),
            ),
            TokenizerMode::UnicodeWords => Box::new(text.unicode_words()),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}
