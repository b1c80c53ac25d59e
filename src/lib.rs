// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. view::ViewMessage)
    clippy::module_name_repetitions
)]

//! # mermaid-view
//!
//! A view component for mermaid diagrams.
//!
//! A [`DiagramView`](view::DiagramView) takes a diagram name and its
//! mermaid source, asks an engine to render it, and shows a loading
//! placeholder until the SVG arrives. The finished SVG is sized to fill its
//! container and embedded verbatim, next to any attributes the caller
//! passed through.
//!
//! ## Architecture
//!
//! The view uses The Elm Architecture (TEA) pattern:
//! - **State**: current props and render result
//! - **Message**: new props, or a finished render
//! - **Update**: pure state transitions
//! - **View**: build the output element
//!
//! ## Modules
//!
//! - [`view`]: The diagram view component
//! - [`engine`]: Engine settings and the rendering seam
//! - [`markup`]: Sizing of engine output
//! - [`raster`]: PNG export
//! - [`app`]: Command-line host loop
//! - [`config`]: Saved command-line defaults
//! - [`watcher`]: File watching

pub mod app;
pub mod config;
pub mod engine;
pub mod markup;
pub mod raster;
pub mod view;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::engine::{DiagramEngine, EngineSettings, MermanBackend, Theme, ThreadedEngine};
    pub use crate::markup::{MarkupError, ensure_sized};
    pub use crate::view::{Attributes, DiagramView, Element, Props};
}
