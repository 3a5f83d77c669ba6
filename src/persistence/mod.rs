//! Persistence primitives: append-only content log and the two index files.

mod codec;
mod content_log;
mod index_files;

pub(crate) use content_log::decode;
pub use content_log::{ContentLog, LogReader};
pub use index_files::{IndexFiles, LoadedIndexes};
