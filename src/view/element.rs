//! Output elements and passthrough attributes.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use thiserror::Error;

/// Tag of the container that embeds rendered markup.
pub const CONTAINER_TAG: &str = "div";

/// Caller-supplied attributes forwarded to the root output element.
///
/// Insertion order is kept so the serialized element is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(IndexMap<String, String>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributeError {
    #[error("attribute \"{0}\" is missing '='")]
    MissingValue(String),
    #[error("invalid attribute name \"{0}\"")]
    InvalidName(String),
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a `name=value` token as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no `=` or the name is not a valid
    /// attribute name.
    pub fn parse_pair(token: &str) -> Result<(String, String), AttributeError> {
        let Some((name, value)) = token.split_once('=') else {
            return Err(AttributeError::MissingValue(token.to_string()));
        };
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(AttributeError::InvalidName(name.to_string()));
        }
        Ok((name.to_string(), value.to_string()))
    }

    fn write_to(&self, out: &mut String) {
        for (name, value) in self.iter() {
            if !is_valid_name(name) {
                tracing::warn!(name, "skipping attribute with invalid name");
                continue;
            }
            let _ = write!(out, " {name}=\"{}\"", Escaped(value));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// A renderable piece of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// Plain text.
    Text(String),
    /// An element with child elements.
    Node {
        tag: String,
        attributes: Attributes,
        children: Vec<Element>,
    },
    /// The rendered-state container: embeds trusted markup without escaping.
    Container {
        attributes: Attributes,
        inner_html: String,
    },
}

impl Element {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn node(tag: impl Into<String>) -> Self {
        Self::Node {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute. No effect on text.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Node { attributes, .. } | Self::Container { attributes, .. } => {
                attributes.insert(name, value);
            }
            Self::Text(_) => {}
        }
        self
    }

    /// Append a child. No effect unless this is a node.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        if let Self::Node { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Attributes on the root, if this element has a root tag.
    pub const fn attributes(&self) -> Option<&Attributes> {
        match self {
            Self::Node { attributes, .. } | Self::Container { attributes, .. } => Some(attributes),
            Self::Text(_) => None,
        }
    }

    /// Serialize to an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) => {
                let _ = write!(out, "{}", Escaped(text));
            }
            Self::Node {
                tag,
                attributes,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                attributes.write_to(out);
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
            Self::Container {
                attributes,
                inner_html,
            } => {
                let _ = write!(out, "<{CONTAINER_TAG}");
                attributes.write_to(out);
                out.push('>');
                out.push_str(inner_html);
                let _ = write!(out, "</{CONTAINER_TAG}>");
            }
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.0;
        let mut start = 0;
        for (i, b) in text.bytes().enumerate() {
            let esc = match b {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                b'\'' => "&#39;",
                _ => continue,
            };
            f.write_str(&text[start..i])?;
            f.write_str(esc)?;
            start = i + 1;
        }
        f.write_str(&text[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(Element::text("a < b & c").to_html(), "a &lt; b &amp; c");
    }

    #[test]
    fn test_container_embeds_markup_verbatim() {
        let el = Element::Container {
            attributes: Attributes::new().with("class", "diagram").with("title", "\"x\""),
            inner_html: "<svg id=\"d\"/>".to_string(),
        };
        assert_eq!(
            el.to_html(),
            r#"<div class="diagram" title="&quot;x&quot;"><svg id="d"/></div>"#
        );
    }

    #[test]
    fn test_node_with_children() {
        let el = Element::node("span")
            .with_attribute("class", "spinner")
            .with_child(Element::text("Rendering"));
        assert_eq!(el.to_html(), r#"<span class="spinner">Rendering</span>"#);
    }

    #[test]
    fn test_attributes_keep_insertion_order_and_replace() {
        let mut attrs = Attributes::new();
        attrs.insert("style", "a");
        attrs.insert("class", "b");
        attrs.insert("style", "c");
        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("style", "c"), ("class", "b")]);
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            Attributes::parse_pair("data-x=1=2"),
            Ok(("data-x".to_string(), "1=2".to_string()))
        );
        assert_eq!(
            Attributes::parse_pair("class"),
            Err(AttributeError::MissingValue("class".to_string()))
        );
        assert_eq!(
            Attributes::parse_pair("on click=x"),
            Err(AttributeError::InvalidName("on click".to_string()))
        );
    }

    #[test]
    fn test_invalid_names_are_skipped_on_output() {
        let attrs: Attributes = [("ok", "1"), ("bad name", "2")].into_iter().collect();
        let el = Element::Container {
            attributes: attrs,
            inner_html: String::new(),
        };
        assert_eq!(el.to_html(), r#"<div ok="1"></div>"#);
    }
}
