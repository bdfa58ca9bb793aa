//! cf-core: Shared types for Caseforge
//!
//! Items, cases, rarity tables, wear classification and the error taxonomy
//! used across all Caseforge crates.

mod error;
mod item;
mod rarity;
mod wear;

pub use error::*;
pub use item::*;
pub use rarity::*;
pub use wear::*;
