//! Live reload of diagram sources.
//!
//! Uses the notify crate for cross-platform file system events. Bursts of
//! events are debounced and a reload is only reported when the file's
//! contents actually changed.
use std::ffi::OsString;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches one diagram source file.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
    last_hash: Option<u64>,
}

impl SourceWatcher {
    /// Watch `path`, treating `initial` as the contents already loaded.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the path cannot be watched.
    pub fn new(path: impl AsRef<Path>, initial: &str, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical; match against the same form.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(
            target = %target_path.display(),
            root = %watch_root.display(),
            "watching diagram source"
        );

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
            last_hash: Some(hash_str(initial)),
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Returns the new contents once a debounced change with different
    /// contents is ready.
    pub fn poll_changed(&mut self) -> Option<String> {
        if !self.take_change_ready() {
            return None;
        }
        let source = match std::fs::read_to_string(&self.target_path) {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(path = %self.target_path.display(), error = %err, "reload failed");
                return None;
            }
        };
        let hash = hash_str(&source);
        if self.last_hash == Some(hash) {
            tracing::debug!(path = %self.target_path.display(), "source unchanged");
            return None;
        }
        self.last_hash = Some(hash);
        Some(source)
    }

    fn take_change_ready(&mut self) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(ev) => {
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "irrelevant event");
                }
                Err(err) => tracing::warn!(error = %err, "watch error"),
            }
        }
        if relevant > 0 {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn hash_str(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
