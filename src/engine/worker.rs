//! Off-thread rendering.

use std::sync::Arc;
use std::time::Instant;

use super::{DiagramEngine, EngineError, RenderCallback, SvgBackend};

/// Runs each render request on its own worker thread.
///
/// Successful renders invoke the callback from the worker thread. Failures
/// are logged and the callback is dropped without being called.
pub struct ThreadedEngine<B> {
    backend: Arc<B>,
}

impl<B: SvgBackend> ThreadedEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: SvgBackend> DiagramEngine for ThreadedEngine<B> {
    fn render(&self, name: &str, code: &str, on_complete: RenderCallback) {
        let backend = Arc::clone(&self.backend);
        let name = name.to_string();
        let code = code.to_string();
        // Thread names may not contain NUL.
        let thread_name = format!("render-{}", name.replace('\0', ""));
        let spawned = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let start = Instant::now();
                match backend.render_svg(&name, &code) {
                    Ok(svg) => {
                        tracing::debug!(
                            name = %name,
                            bytes = svg.len(),
                            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                            "render finished"
                        );
                        on_complete(svg);
                    }
                    Err(err) => {
                        tracing::error!(name = %name, error = %err, "render failed");
                    }
                }
            });
        if let Err(err) = spawned {
            tracing::error!(error = %EngineError::Spawn(err), "render not started");
        }
    }
}
