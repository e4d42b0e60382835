#![forbid(unsafe_code)]

//! Headless pedigree layout.
//!
//! Entries for one family are split into forests of generation levels ([`build_forests`]),
//! each forest is laid out as a tangled tree ([`compute_layout`]), and [`layout_pedigree`]
//! runs both steps and places the forests side by side. Everything is synchronous and
//! recomputed from scratch on every call.

pub mod compose;
pub mod error;
pub mod forest;
pub mod input;
pub mod model;
pub mod options;
pub mod tangle;
mod validate;

pub use compose::{PedigreeLayout, layout_pedigree};
pub use error::{Error, Result};
pub use forest::{Forest, ForestNode, Partition, build_forests};
pub use input::{parse_json, parse_ped, select_family, to_ped};
pub use model::{Affected, PedigreeEntry, Sex};
pub use options::LayoutOptions;
pub use tangle::{Bounds, ForestLayout, LayoutBundle, LayoutLink, LayoutNode, compute_layout};
pub use validate::validate_entries;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
