use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use crate::engine::{DiagramEngine, RenderCallback};
use crate::view::Attributes;

use super::{App, default_name_for};

/// Engine that answers synchronously, embedding the source in the SVG.
struct EchoEngine {
    id_override: Option<String>,
}

impl EchoEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self { id_override: None })
    }

    fn with_wrong_id() -> Arc<Self> {
        Arc::new(Self {
            id_override: Some("not-the-name".to_string()),
        })
    }
}

impl DiagramEngine for EchoEngine {
    fn render(&self, name: &str, code: &str, on_complete: RenderCallback) {
        let id = self.id_override.as_deref().unwrap_or(name);
        on_complete(format!(
            r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg"><desc>{code}</desc></svg>"#
        ));
    }
}

fn write_source(dir: &Path, file: &str, code: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, code).unwrap();
    path
}

#[test]
fn test_default_name_is_sanitized_file_stem() {
    assert_eq!(default_name_for(Path::new("docs/My Flow.mmd")), "My-Flow");
    assert_eq!(default_name_for(Path::new("2024.mmd")), "m-2024");
}

#[test]
fn test_explicit_name_wins() {
    let app = App::new(PathBuf::from("flow.mmd")).with_name(Some("custom".to_string()));
    assert_eq!(app.diagram_name(), "custom");
}

#[test]
fn test_run_writes_container_with_attributes() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "flow.mmd", "graph TD");
    let attrs: Attributes = [("class", "diagram")].into_iter().collect();
    let app = App::new(path).with_attributes(attrs);

    let mut out = Vec::new();
    app.run_with_engine(EchoEngine::new(), &mut out).unwrap();

    let html = String::from_utf8(out).unwrap();
    assert_eq!(
        html,
        "<div class=\"diagram\"><svg width=\"100%\" height=\"100%\" id=\"flow\" xmlns=\"http://www.w3.org/2000/svg\"><desc>graph TD</desc></svg></div>\n"
    );
}

#[test]
fn test_run_writes_output_file() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "seq.mmd", "sequenceDiagram");
    let output = dir.path().join("seq.html");
    let app = App::new(path).with_output(Some(output.clone()));

    let mut out = Vec::new();
    app.run_with_engine(EchoEngine::new(), &mut out).unwrap();

    assert!(out.is_empty());
    let html = std::fs::read_to_string(output).unwrap();
    assert!(html.starts_with("<div><svg "));
    assert!(html.contains("sequenceDiagram"));
}

#[test]
fn test_missing_target_times_out() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "flow.mmd", "graph TD");
    let app = App::new(path).with_timeout(Duration::from_millis(300));

    let mut out = Vec::new();
    let err = app
        .run_with_engine(EchoEngine::with_wrong_id(), &mut out)
        .unwrap_err();
    assert!(err.to_string().contains("did not finish rendering"));
    assert!(out.is_empty());
}

#[test]
fn test_missing_source_is_error() {
    let dir = tempdir().unwrap();
    let app = App::new(dir.path().join("absent.mmd"));
    let mut out = Vec::new();
    let err = app.run_with_engine(EchoEngine::new(), &mut out).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_watch_rerenders_on_change() {
    let dir = tempdir().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let path = write_source(&canonical, "flow.mmd", "graph TD; A-->B");
    let output = canonical.join("flow.html");
    let app = App::new(path.clone())
        .with_watch(true)
        .with_output(Some(output.clone()))
        .with_max_renders(Some(2))
        .with_timeout(Duration::from_secs(10));

    let writer = std::thread::spawn(move || {
        // Let the first render land and the watcher register.
        std::thread::sleep(Duration::from_millis(800));
        std::fs::write(&path, "graph TD; A-->C").unwrap();
    });

    let mut out = Vec::new();
    app.run_with_engine(EchoEngine::new(), &mut out).unwrap();
    writer.join().unwrap();

    let html = std::fs::read_to_string(output).unwrap();
    assert!(html.contains("A-->C"));
}
