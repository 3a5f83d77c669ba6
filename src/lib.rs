pub mod config;
pub mod error;
pub mod index;
pub mod persistence;
pub mod store;
pub mod tokenizer;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{StoreConfig, TokenizerConfig, TokenizerMode};
pub use error::{Result, StoreError};
pub use store::{SharedStringStore, StringStore};
pub use tokenizer::Tokenizer;
pub use types::{ContentOffset, LinkHash, StoreStats, TermMode};
