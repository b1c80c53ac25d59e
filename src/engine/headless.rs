//! Mermaid rendering through `merman`.

use merman::MermaidConfig;
use merman::render::HeadlessRenderer;

use super::{EngineError, EngineSettings, SvgBackend};

/// Renders mermaid source headlessly with the configured theme.
#[derive(Clone)]
pub struct MermanBackend {
    renderer: HeadlessRenderer,
}

impl MermanBackend {
    pub fn new(settings: &EngineSettings) -> Self {
        let site_config = MermaidConfig::from_value(settings.site_config());
        Self {
            renderer: HeadlessRenderer::new().with_site_config(site_config),
        }
    }
}

impl SvgBackend for MermanBackend {
    fn render_svg(&self, name: &str, code: &str) -> Result<String, EngineError> {
        // The id is passed through untouched so the root element can be
        // located by exactly the name the view asked for.
        let mut svg_options = self.renderer.svg.clone();
        svg_options.diagram_id = Some(name.to_string());
        self.renderer
            .render_svg_sync_with(code, &svg_options)?
            .ok_or(EngineError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ensure_sized;

    #[test]
    fn test_render_flowchart_uses_name_as_root_id() {
        let backend = MermanBackend::new(&EngineSettings::default());
        let svg = backend
            .render_svg("flow-1", "flowchart LR\n    A[Start] --> B[End]")
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(r#"id="flow-1""#));

        let sized = ensure_sized(&svg, "flow-1").unwrap();
        let doc = roxmltree::Document::parse(&sized).unwrap();
        let root = doc.root_element();
        assert!(root.has_attribute("width"));
        assert!(root.has_attribute("height"));
    }

    #[test]
    fn test_render_unknown_diagram_type_is_error() {
        let backend = MermanBackend::new(&EngineSettings::default());
        assert!(backend.render_svg("bad", "not a diagram at all").is_err());
    }
}
