//! CSS-like selectors for render targets.
//!
//! Supported grammar:
//! - compounds: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`, `[attr="value"]`
//! - combinators: descendant (whitespace) and child (`>`)
//! - groups: `a, b`

use std::str::FromStr;

use crate::error::{Result, UiError};

use super::node::{Document, NodeId, NodeType};

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

/// One compound selector, e.g. `li.active[data-key=3]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// A chain of compounds read left to right; `links[i]` joins
/// `parts[i]` to `parts[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<Compound>,
    links: Vec<Combinator>,
}

/// Parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for group in source.split(',') {
            alternatives.push(parse_complex(source, group)?);
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Does `node` match any alternative?
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| matches_complex(doc, node, c))
    }
}

impl FromStr for Selector {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn invalid(selector: &str, reason: impl Into<String>) -> UiError {
    UiError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_complex(source: &str, group: &str) -> Result<Complex> {
    let chars: Vec<char> = group.trim().chars().collect();
    if chars.is_empty() {
        return Err(invalid(source, "empty selector"));
    }

    let mut parts = Vec::new();
    let mut links = Vec::new();
    let mut pos = 0;
    let mut pending: Option<Combinator> = None;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            if pending.is_none() && !parts.is_empty() {
                pending = Some(Combinator::Descendant);
            }
            pos += 1;
            continue;
        }
        if c == '>' {
            if parts.is_empty() || pending == Some(Combinator::Child) {
                return Err(invalid(source, "dangling '>'"));
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }

        let (compound, next) = parse_compound(source, &chars, pos)?;
        if !parts.is_empty() {
            links.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        pending = None;
        parts.push(compound);
        pos = next;
    }

    if pending == Some(Combinator::Child) {
        return Err(invalid(source, "selector ends with '>'"));
    }
    Ok(Complex { parts, links })
}

fn read_ident(chars: &[char], mut pos: usize) -> (String, usize) {
    let start = pos;
    while pos < chars.len() && is_ident(chars[pos]) {
        pos += 1;
    }
    (chars[start..pos].iter().collect(), pos)
}

fn parse_compound(source: &str, chars: &[char], mut pos: usize) -> Result<(Compound, usize)> {
    let mut compound = Compound::default();
    let start = pos;

    if chars[pos] == '*' {
        pos += 1;
    } else if is_ident(chars[pos]) {
        let (tag, next) = read_ident(chars, pos);
        compound.tag = Some(tag.to_ascii_lowercase());
        pos = next;
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                let (id, next) = read_ident(chars, pos + 1);
                if id.is_empty() {
                    return Err(invalid(source, "expected id after '#'"));
                }
                compound.id = Some(id);
                pos = next;
            }
            '.' => {
                let (class, next) = read_ident(chars, pos + 1);
                if class.is_empty() {
                    return Err(invalid(source, "expected class after '.'"));
                }
                compound.classes.push(class);
                pos = next;
            }
            '[' => {
                let close = chars[pos..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|off| pos + off)
                    .ok_or_else(|| invalid(source, "unterminated '['"))?;
                let body: String = chars[pos + 1..close].iter().collect();
                compound.attrs.push(parse_attr_test(source, &body)?);
                pos = close + 1;
            }
            _ => break,
        }
    }

    if pos == start {
        return Err(invalid(source, format!("unexpected character '{}'", chars[pos])));
    }
    Ok((compound, pos))
}

fn parse_attr_test(source: &str, body: &str) -> Result<AttrTest> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            if name.is_empty() {
                return Err(invalid(source, "empty attribute test"));
            }
            Ok(AttrTest::Exists(name.to_ascii_lowercase()))
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid(source, "empty attribute name"));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Ok(AttrTest::Equals(name.to_ascii_lowercase(), value.to_string()))
        }
    }
}

// =============================================================================
// Matching
// =============================================================================

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    if doc.node_type(node) != Some(NodeType::Element) {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if doc.tag_name(node) != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if doc.get_attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let classes = doc.get_attribute(node, "class").unwrap_or("");
        let have: Vec<&str> = classes.split_whitespace().collect();
        if !compound.classes.iter().all(|c| have.contains(&c.as_str())) {
            return false;
        }
    }
    compound.attrs.iter().all(|test| match test {
        AttrTest::Exists(name) => doc.has_attribute(node, name),
        AttrTest::Equals(name, value) => doc.get_attribute(node, name) == Some(value.as_str()),
    })
}

/// Right-to-left match with backtracking over descendant links.
fn matches_from(doc: &Document, node: NodeId, complex: &Complex, idx: usize) -> bool {
    if !matches_compound(doc, node, &complex.parts[idx]) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match complex.links[idx - 1] {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| matches_from(doc, p, complex, idx - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .any(|a| matches_from(doc, a, complex, idx - 1)),
    }
}

fn matches_complex(doc: &Document, node: NodeId, complex: &Complex) -> bool {
    matches_from(doc, node, complex, complex.parts.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let main = doc.create_element("div");
        doc.set_attribute(main, "id", "main");
        let ul = doc.create_element("ul");
        doc.set_attribute(ul, "class", "list dark");
        let li = doc.create_element("li");
        doc.set_attribute(li, "data-key", "k2");
        doc.append_child(root, main).unwrap();
        doc.append_child(main, ul).unwrap();
        doc.append_child(ul, li).unwrap();
        (doc, main, ul, li)
    }

    #[test]
    fn test_simple_selectors() {
        let (doc, main, ul, li) = tree();
        let root = doc.root();

        let sel = Selector::parse("#main").unwrap();
        assert_eq!(doc.query_selector(root, &sel), Some(main));

        let sel = Selector::parse("ul.dark").unwrap();
        assert_eq!(doc.query_selector(root, &sel), Some(ul));

        let sel = Selector::parse("[data-key=\"k2\"]").unwrap();
        assert_eq!(doc.query_selector(root, &sel), Some(li));

        let sel = Selector::parse(".missing").unwrap();
        assert_eq!(doc.query_selector(root, &sel), None);
    }

    #[test]
    fn test_combinators() {
        let (doc, _, _, li) = tree();
        let root = doc.root();

        let sel = Selector::parse("#main li").unwrap();
        assert_eq!(doc.query_selector(root, &sel), Some(li));

        let sel = Selector::parse("ul > li").unwrap();
        assert_eq!(doc.query_selector(root, &sel), Some(li));

        let sel = Selector::parse("#main > li").unwrap();
        assert_eq!(doc.query_selector(root, &sel), None);
    }

    #[test]
    fn test_groups_and_scope() {
        let (doc, main, ul, li) = tree();

        let sel = Selector::parse("li, ul").unwrap();
        assert_eq!(doc.query_selector_all(doc.root(), &sel), vec![ul, li]);

        // Scope excludes the scope node itself
        let sel = Selector::parse("ul").unwrap();
        assert_eq!(doc.query_selector(ul, &sel), None);
        assert_eq!(doc.query_selector(main, &sel), Some(ul));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "> li", "ul >", "[x", "#", "li!"] {
            assert!(
                matches!(Selector::parse(bad), Err(UiError::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
