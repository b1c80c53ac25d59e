//! Command-line host for a single diagram view.
//!
//! The app mounts one [`DiagramView`](crate::view::DiagramView) for a source
//! file and runs a small Elm-style loop:
//! - [`Message`]: view mailbox traffic and source reloads
//! - [`App::run`]: the event loop, writing output whenever a new result lands

mod event_loop;

pub use event_loop::Message;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineSettings;
use crate::view::{Attributes, sanitize_name};

/// Default wait for the first render before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default width of PNG exports in pixels.
pub const DEFAULT_PNG_WIDTH: u32 = 1200;

/// Renders one diagram source file to an HTML fragment.
pub struct App {
    source_path: PathBuf,
    name: Option<String>,
    attributes: Attributes,
    settings: EngineSettings,
    watch: bool,
    output: Option<PathBuf>,
    png: Option<PathBuf>,
    png_width: u32,
    timeout: Duration,
    max_renders: Option<usize>,
}

impl App {
    /// Create an app for the given diagram source.
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            source_path,
            name: None,
            attributes: Attributes::new(),
            settings: EngineSettings::default(),
            watch: false,
            output: None,
            png: None,
            png_width: DEFAULT_PNG_WIDTH,
            timeout: DEFAULT_TIMEOUT,
            max_renders: None,
        }
    }

    /// Use `name` as the diagram id instead of one derived from the file.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Re-render whenever the source file changes.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    /// Write the fragment to `path` instead of stdout.
    #[must_use]
    pub fn with_output(mut self, path: Option<PathBuf>) -> Self {
        self.output = path;
        self
    }

    /// Also rasterize each result to `path`.
    #[must_use]
    pub fn with_png(mut self, path: Option<PathBuf>, width: u32) -> Self {
        self.png = path;
        self.png_width = width;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop after this many results have been written.
    #[must_use]
    pub const fn with_max_renders(mut self, max: Option<usize>) -> Self {
        self.max_renders = max;
        self
    }

    /// The diagram id in use.
    pub fn diagram_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| default_name_for(&self.source_path))
    }
}

/// Derive a diagram id from a file name.
pub fn default_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_name(&stem)
}

#[cfg(test)]
mod tests;
