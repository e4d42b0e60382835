#![forbid(unsafe_code)]

//! SVG output for pedigree layouts.
//!
//! Rendering is a pure function of a computed [`PedigreeLayout`] and the entries it was built
//! from. [`PedigreeView`] adds the interactive side: it keeps the geometry around and forwards
//! clicks to the caller by individual id.

pub mod svg;
pub mod view;

pub use pedigree_layout::PedigreeLayout;
pub use svg::{
    NodeShape, SvgRenderOptions, render_fallback_svg, render_layout_result, render_pedigree_svg,
};
pub use view::PedigreeView;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] pedigree_layout::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
