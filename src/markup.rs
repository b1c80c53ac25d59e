//! Post-processing of engine markup.
//!
//! The engine returns a full SVG document. Before embedding we pick out the
//! element carrying the diagram's id and make sure it has explicit `width`
//! and `height` attributes so the surrounding container decides how large
//! the diagram is displayed.

use std::fmt::Write as _;

use thiserror::Error;

/// Value given to a missing `width` or `height` attribute.
pub const FILL: &str = "100%";

const SIZE_ATTRIBUTES: [&str; 2] = ["width", "height"];

/// Why markup could not be prepared for embedding.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The engine output is not well-formed XML.
    #[error("engine markup is not well-formed: {0}")]
    Parse(#[from] roxmltree::Error),
    /// No element in the markup carries the requested id.
    #[error("markup did not contain node with id \"{id}\"")]
    NotFound { id: String },
}

/// Extract the element identified by `target_id` and default its size.
///
/// Missing `width`/`height` attributes are set to [`FILL`]; attributes that
/// are already present keep their value. The element is returned as it
/// appears in `markup`, with any added attributes placed directly after the
/// tag name.
///
/// # Errors
///
/// Returns [`MarkupError::Parse`] if `markup` is not well-formed and
/// [`MarkupError::NotFound`] if no element has `id == target_id`.
pub fn ensure_sized(markup: &str, target_id: &str) -> Result<String, MarkupError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(markup, options)?;
    let node = doc
        .descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(target_id))
        .ok_or_else(|| MarkupError::NotFound {
            id: target_id.to_string(),
        })?;

    let element = &markup[node.range()];
    let missing: Vec<&str> = SIZE_ATTRIBUTES
        .into_iter()
        .filter(|attr| !node.has_attribute(*attr))
        .collect();
    if missing.is_empty() {
        return Ok(element.to_string());
    }

    let split = tag_name_end(element);
    let mut out = String::with_capacity(element.len() + missing.len() * 16);
    out.push_str(&element[..split]);
    for attr in missing {
        let _ = write!(out, " {attr}=\"{FILL}\"");
    }
    out.push_str(&element[split..]);
    Ok(out)
}

/// Byte offset just past the (possibly prefixed) tag name of a start tag.
fn tag_name_end(element: &str) -> usize {
    element
        .char_indices()
        .skip(1)
        .find(|(_, ch)| ch.is_whitespace() || *ch == '/' || *ch == '>')
        .map_or(element.len(), |(i, _)| i)
}
