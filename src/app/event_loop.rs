use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::app::App;
use crate::engine::{self, DiagramEngine, MermanBackend, ThreadedEngine};
use crate::raster::Rasterizer;
use crate::view::{self, DiagramView, Props, Ticket};
use crate::watcher::SourceWatcher;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Events handled by the app loop.
#[derive(Debug)]
pub enum Message {
    /// Traffic for the mounted view.
    View(view::Message),
    /// The source file now holds different text.
    SourceChanged(String),
}

impl App {
    /// Render the source file with the `merman` engine.
    ///
    /// Without watching, returns once the first result has been written.
    /// With watching, keeps re-rendering on change until `max_renders`
    /// results were written (forever when unset).
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, output cannot be
    /// written, or no result arrives within the timeout.
    pub fn run(&self) -> Result<()> {
        let settings = engine::init(self.settings.clone());
        let engine = Arc::new(ThreadedEngine::new(MermanBackend::new(settings)));
        let mut out = std::io::stdout();
        self.run_with_engine(engine, &mut out)
    }

    /// Run the loop against any engine, writing fragments to `out` when no
    /// output file is configured.
    ///
    /// # Errors
    ///
    /// See [`App::run`].
    pub fn run_with_engine(&self, engine: Arc<dyn DiagramEngine>, out: &mut dyn Write) -> Result<()> {
        let source = std::fs::read_to_string(&self.source_path)
            .with_context(|| format!("Failed to read {}", self.source_path.display()))?;
        let name = self.diagram_name();

        let mut watcher = if self.watch {
            match SourceWatcher::new(&self.source_path, &source, WATCH_DEBOUNCE) {
                Ok(watcher) => Some(watcher),
                Err(err) => {
                    tracing::warn!(
                        path = %self.source_path.display(),
                        error = %err,
                        "watch unavailable"
                    );
                    None
                }
            }
        } else {
            None
        };

        let rasterizer = self.png.as_ref().map(|_| Rasterizer::new());
        let (tx, rx) = mpsc::channel();
        let mut view = DiagramView::mount(self.props(&name, source), engine, tx);
        let started = Instant::now();
        let mut written: Option<Ticket> = None;
        let mut renders = 0usize;

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(msg) => self.handle_message(&mut view, Message::View(msg)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("render mailbox closed");
                }
            }

            if let Some(changed) = watcher.as_mut().and_then(SourceWatcher::poll_changed) {
                self.handle_message(&mut view, Message::SourceChanged(changed));
            }

            let state = view.state();
            if let (Some(markup), Some(ticket)) = (state.rendered(), state.current_ticket())
                && written != Some(ticket)
            {
                self.write_outputs(&view.view(), markup, rasterizer.as_ref(), out)?;
                written = Some(ticket);
                renders += 1;
                tracing::debug!(name = %name, renders, "result written");

                if watcher.is_none() || self.max_renders.is_some_and(|max| renders >= max) {
                    return Ok(());
                }
            }

            if written.is_none() && started.elapsed() >= self.timeout {
                anyhow::bail!(
                    "diagram \"{name}\" did not finish rendering within {:.1}s",
                    self.timeout.as_secs_f64()
                );
            }
        }
    }

    fn props(&self, name: &str, code: String) -> Props {
        Props::new(name, code).with_attributes(self.attributes.clone())
    }

    fn handle_message(&self, view: &mut DiagramView, msg: Message) {
        match msg {
            Message::View(msg) => view.dispatch(msg),
            Message::SourceChanged(code) => {
                tracing::debug!(path = %self.source_path.display(), "source changed");
                let name = view.state().props().name.clone();
                view.set_props(self.props(&name, code));
            }
        }
    }

    fn write_outputs(
        &self,
        element: &view::Element,
        markup: &str,
        rasterizer: Option<&Rasterizer>,
        out: &mut dyn Write,
    ) -> Result<()> {
        let html = element.to_html();
        if let Some(path) = &self.output {
            std::fs::write(path, format!("{html}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
        } else {
            writeln!(out, "{html}").context("Failed to write output")?;
            out.flush()?;
        }
        if let (Some(path), Some(rasterizer)) = (&self.png, rasterizer) {
            rasterizer.write_png(markup, self.png_width, path)?;
        }
        Ok(())
    }
}
