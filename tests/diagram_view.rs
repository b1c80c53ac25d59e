//! End-to-end behavior of a mounted view driven through its mailbox.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mermaid_view::engine::{DiagramEngine, EngineError, RenderCallback, SvgBackend};
use mermaid_view::prelude::*;
use mermaid_view::view::{self, LOADING_TEXT};

/// Backend returning a fixed SVG per request, recording what it was asked.
#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<(String, String)>>,
}

impl SvgBackend for RecordingBackend {
    fn render_svg(&self, name: &str, code: &str) -> Result<String, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), code.to_string()));
        Ok(format!(
            r#"<?xml version="1.0"?><svg id="{name}" width="50%" xmlns="http://www.w3.org/2000/svg"><text>{}</text></svg>"#,
            code.len()
        ))
    }
}

fn wait_rendered(view: &mut DiagramView, rx: &mpsc::Receiver<view::Message>) {
    while view.state().is_loading() {
        let msg = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("render should complete");
        view.dispatch(msg);
    }
}

#[test]
fn test_threaded_engine_drives_view_to_rendered() {
    let engine = Arc::new(ThreadedEngine::new(RecordingBackend::default()));
    let (tx, rx) = mpsc::channel();
    let props = Props::new("arch", "graph LR; A-->B").with_attribute("class", "diagram");
    let mut view = DiagramView::mount(props, engine.clone(), tx);

    assert_eq!(view.view().to_html(), LOADING_TEXT);
    wait_rendered(&mut view, &rx);

    let html = view.view().to_html();
    assert!(html.starts_with(r#"<div class="diagram"><svg height="100%" id="arch" width="50%""#));
    assert!(!html.contains("<?xml"), "only the target element is embedded");
    assert_eq!(
        engine.backend().calls.lock().unwrap().as_slice(),
        &[("arch".to_string(), "graph LR; A-->B".to_string())]
    );
}

#[test]
fn test_new_code_rerenders_once() {
    let engine = Arc::new(ThreadedEngine::new(RecordingBackend::default()));
    let (tx, rx) = mpsc::channel();
    let mut view = DiagramView::mount(Props::new("d", "a"), engine.clone(), tx);
    wait_rendered(&mut view, &rx);

    view.set_props(Props::new("d", "abc"));
    assert!(view.state().is_loading());
    wait_rendered(&mut view, &rx);

    assert!(view.state().rendered().unwrap().contains("<text>3</text>"));
    assert_eq!(engine.backend().calls.lock().unwrap().len(), 2);
}

#[test]
fn test_custom_engine_behind_trait_object() {
    struct Silent;
    impl DiagramEngine for Silent {
        fn render(&self, _name: &str, _code: &str, _on_complete: RenderCallback) {}
    }

    let engine: Arc<dyn DiagramEngine> = Arc::new(Silent);
    let (tx, _rx) = mpsc::channel();
    let view = DiagramView::mount(
        Props::new("d", "graph TD").with_loading(|| Element::text("Please wait")),
        engine,
        tx,
    );
    assert_eq!(view.view().to_html(), "Please wait");
    assert_eq!(view.view().attributes(), None);
}

#[test]
fn test_ensure_sized_is_usable_standalone() {
    let sized = ensure_sized(r#"<svg id="x"/>"#, "x").unwrap();
    assert_eq!(sized, r#"<svg width="100%" height="100%" id="x"/>"#);
    assert!(matches!(
        ensure_sized(r#"<svg id="x"/>"#, "y"),
        Err(MarkupError::NotFound { .. })
    ));
}
