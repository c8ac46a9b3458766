//! View Registry - named, detached template subtrees.
//!
//! Templates live in the engine's document but are never connected to its
//! root. Cloning produces an independent detached copy; redefining a name
//! silently replaces (and frees) the previous template.

use std::collections::HashMap;

use tracing::debug;

use crate::dom::{markup, Document, NodeId, NodeType};
use crate::error::{Result, UiError};

#[derive(Default)]
pub struct ViewRegistry {
    views: HashMap<String, NodeId>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` and store it under `name`.
    ///
    /// Leading and trailing whitespace-only text is dropped. A single
    /// remaining node becomes the template itself; several nodes stay
    /// wrapped in a fragment.
    pub fn define_markup(&mut self, doc: &mut Document, name: &str, source: &str) -> Result<()> {
        let fragment = markup::parse_fragment(doc, source)?;
        trim_whitespace_edges(doc, fragment);

        let single = match doc.children(fragment) {
            [only] => Some(*only),
            _ => None,
        };
        match single {
            Some(only) => {
                doc.detach(only);
                doc.discard(fragment);
                self.define_node(doc, name, only);
            }
            None => self.define_node(doc, name, fragment),
        }
        Ok(())
    }

    /// Store `node` (detached first) under `name`.
    pub fn define_node(&mut self, doc: &mut Document, name: &str, node: NodeId) {
        doc.detach(node);
        if let Some(old) = self.views.insert(name.to_string(), node) {
            if old != node {
                doc.discard(old);
            }
        }
        debug!(view = %name, node = ?node, "view defined");
    }

    /// Deep, detached copy of the template named `name`.
    pub fn clone_view(&self, doc: &mut Document, name: &str) -> Result<NodeId> {
        let template = self
            .views
            .get(name)
            .copied()
            .ok_or_else(|| UiError::UnknownView(name.to_string()))?;
        doc.deep_clone(template)
    }

    pub fn has(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    pub fn template(&self, name: &str) -> Option<NodeId> {
        self.views.get(name).copied()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.views.keys().cloned().collect();
        names.sort();
        names
    }
}

fn is_blank_text(doc: &Document, node: NodeId) -> bool {
    doc.node_type(node) == Some(NodeType::Text)
        && doc.text(node).is_some_and(|t| t.trim().is_empty())
}

fn trim_whitespace_edges(doc: &mut Document, fragment: NodeId) {
    while let Some(first) = doc.first_child(fragment).filter(|&n| is_blank_text(doc, n)) {
        doc.discard(first);
    }
    while let Some(last) = doc.children(fragment).last().copied().filter(|&n| is_blank_text(doc, n)) {
        doc.discard(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::markup::outer_markup;

    #[test]
    fn test_clone_is_deep_and_independent() {
        let mut doc = Document::new();
        let mut views = ViewRegistry::new();
        views.define_markup(&mut doc, "row", "<tr><td>$$</td></tr>").unwrap();

        let a = views.clone_view(&mut doc, "row").unwrap();
        let b = views.clone_view(&mut doc, "row").unwrap();
        assert_ne!(a, b);
        assert_eq!(outer_markup(&doc, a), "<tr><td>$$</td></tr>");
        assert_eq!(outer_markup(&doc, a), outer_markup(&doc, b));

        doc.set_attribute(a, "class", "changed");
        let cell = doc.first_child(doc.first_child(b).unwrap()).unwrap();
        doc.set_text(cell, "other");
        assert_eq!(outer_markup(&doc, a), r#"<tr class="changed"><td>$$</td></tr>"#);
        assert_eq!(outer_markup(&doc, b), "<tr><td>other</td></tr>");

        let template = views.template("row").unwrap();
        assert_eq!(outer_markup(&doc, template), "<tr><td>$$</td></tr>");
        assert!(doc.parent(a).is_none());
    }

    #[test]
    fn test_unknown_view_names_the_view() {
        let mut doc = Document::new();
        let views = ViewRegistry::new();
        let err = views.clone_view(&mut doc, "detail").unwrap_err();
        assert!(matches!(err, UiError::UnknownView(ref n) if n == "detail"));
        assert!(err.to_string().contains("detail"));
    }

    #[test]
    fn test_redefinition_overwrites() {
        let mut doc = Document::new();
        let mut views = ViewRegistry::new();
        views.define_markup(&mut doc, "v", "<p>old</p>").unwrap();
        let old = views.template("v").unwrap();
        views.define_markup(&mut doc, "v", "<p>new</p>").unwrap();

        assert!(!doc.contains(old));
        let copy = views.clone_view(&mut doc, "v").unwrap();
        assert_eq!(outer_markup(&doc, copy), "<p>new</p>");
    }

    #[test]
    fn test_multi_root_view_keeps_fragment() {
        let mut doc = Document::new();
        let mut views = ViewRegistry::new();
        views
            .define_markup(&mut doc, "pair", "\n  <dt>$key</dt>\n  <dd>$value</dd>\n")
            .unwrap();
        let copy = views.clone_view(&mut doc, "pair").unwrap();
        assert_eq!(doc.node_type(copy), Some(NodeType::Fragment));
        assert_eq!(doc.children(copy).len(), 3);
    }
}
