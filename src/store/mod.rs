//! String store: content log plus term and link indexes
//!
//! - `StringStore`: owns every structure; links, fetches and searches strings
//! - `SharedStringStore`: lock-guarded slot for an embedding engine

mod search;
mod shared;
#[allow(clippy::module_inception)]
mod store;

pub use shared::SharedStringStore;
pub use store::StringStore;
