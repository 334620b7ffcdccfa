//! ita-board/crates/ib-core/src/lib.rs
//!
//! The central domain logic and interface definitions for ita-board:
//! models, the datastore port, input sanitization, and the legacy
//! (2channel-style) export formatter.

pub mod error;
pub mod legacy;
pub mod models;
pub mod sanitize;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
