//! Testing infrastructure for correctness verification
//!
//! Structural invariants over a live [`StringStore`](crate::StringStore).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sc_strings::testing::prelude::*;
//!
//! store.link_string(42, "hello world")?;
//! let violations = check_all_invariants(&store, &default_invariants());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **OwnersMatchReferences**: owner sets mirror identifier references
//! - **OffsetsWithinLog**: indexed offsets lie inside the content log
//! - **LinkedContentIndexed**: linked strings are readable and term-indexed

pub mod invariants;

pub use invariants::{
    check_all_invariants, default_invariants, Invariant, LinkedContentIndexed, OffsetsWithinLog,
    OwnersMatchReferences, Violation,
};

/// Prelude for easy imports
pub mod prelude {
    pub use super::invariants::{check_all_invariants, default_invariants, Invariant, Violation};
}
