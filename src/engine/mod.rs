//! Diagram engine integration.
//!
//! The view never renders diagrams itself. It hands `(name, code)` to a
//! [`DiagramEngine`] and waits for the completion callback:
//! - [`EngineSettings`]: immutable, process-wide engine configuration
//! - [`SvgBackend`]: synchronous source-to-SVG conversion
//! - [`ThreadedEngine`]: runs a backend off the UI thread and calls back

mod headless;
mod worker;

pub use headless::MermanBackend;
pub use worker::ThreadedEngine;

use std::sync::OnceLock;

use thiserror::Error;

static SETTINGS: OnceLock<EngineSettings> = OnceLock::new();

/// Visual theme passed to the engine.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Default,
    #[default]
    Neutral,
    Dark,
    Forest,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Neutral => "neutral",
            Self::Dark => "dark",
            Self::Forest => "forest",
        }
    }
}

/// Engine configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Whether the engine scans for diagrams on its own. Always off here:
    /// rendering only happens on explicit request.
    pub start_on_load: bool,
    pub theme: Theme,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            start_on_load: false,
            theme: Theme::Neutral,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub const fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Site configuration object understood by the engine.
    pub fn site_config(&self) -> serde_json::Value {
        serde_json::json!({
            "startOnLoad": self.start_on_load,
            "theme": self.theme.as_str(),
        })
    }
}

/// Install the process-wide engine settings.
///
/// The first call wins. Later calls return the settings already in effect;
/// a call with different settings is logged and otherwise ignored.
pub fn init(settings: EngineSettings) -> &'static EngineSettings {
    let mut installed = false;
    let active = SETTINGS.get_or_init(|| {
        installed = true;
        settings.clone()
    });
    if installed {
        tracing::debug!(theme = active.theme.as_str(), "engine settings installed");
    } else if *active != settings {
        tracing::debug!(
            active = ?active,
            requested = ?settings,
            "engine already initialized; ignoring new settings"
        );
    }
    active
}

/// Completion callback receiving the rendered markup.
pub type RenderCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// An asynchronous diagram renderer.
///
/// `render` must not block the caller. On success `on_complete` is invoked
/// exactly once, possibly from another thread, with an SVG document that
/// contains an element whose id is `name`. On failure it is never invoked.
pub trait DiagramEngine: Send + Sync {
    fn render(&self, name: &str, code: &str, on_complete: RenderCallback);
}

/// A synchronous source-to-SVG converter.
pub trait SvgBackend: Send + Sync + 'static {
    /// Render `code` to an SVG document whose root element has id `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed or laid out.
    fn render_svg(&self, name: &str, code: &str) -> Result<String, EngineError>;
}

/// Failures inside an engine. These never reach the view.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Merman(#[from] merman::render::HeadlessError),
    #[error("source did not contain a diagram")]
    Empty,
    #[error("failed to start render worker: {0}")]
    Spawn(#[source] std::io::Error),
}
