//! Markup - Parse HTML-ish source into document nodes and serialize back.
//!
//! The parser is forgiving in the way view markup needs:
//! - tag and attribute names are lowercased
//! - attributes may be quoted, unquoted or bare (`<li live>`)
//! - void elements and `/>` close themselves
//! - stray close tags are ignored, unclosed elements close at end of input
//!
//! Only unterminated comments and tags are errors.

use crate::error::{Result, UiError};

use super::node::{Document, NodeId, NodeKind};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Parse `source` into a new detached fragment.
pub fn parse_fragment(doc: &mut Document, source: &str) -> Result<NodeId> {
    let fragment = doc.create_fragment();
    let mut parser = Parser {
        src: source,
        pos: 0,
    };
    parser.run(doc, fragment)?;
    Ok(fragment)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, message: impl Into<String>) -> UiError {
        UiError::Markup {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn run(&mut self, doc: &mut Document, fragment: NodeId) -> Result<()> {
        // Open element stack: (node, tag)
        let mut stack: Vec<(NodeId, String)> = Vec::new();

        while self.pos < self.src.len() {
            let current = stack.last().map(|(n, _)| *n).unwrap_or(fragment);
            let rest = self.rest();

            if rest.starts_with("<!--") {
                let body_start = self.pos + 4;
                let end = self.src[body_start..]
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                let text = &self.src[body_start..body_start + end];
                let comment = doc.create_comment(text);
                doc.append_child(current, comment)?;
                self.pos = body_start + end + 3;
            } else if rest.starts_with("</") {
                let end = rest.find('>').ok_or_else(|| self.error("unterminated close tag"))?;
                let tag = rest[2..end].trim().to_ascii_lowercase();
                self.pos += end + 1;
                if let Some(depth) = stack.iter().rposition(|(_, t)| *t == tag) {
                    stack.truncate(depth);
                }
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                let (element, tag, self_closing) = self.open_tag(doc)?;
                doc.append_child(current, element)?;
                if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                    stack.push((element, tag));
                }
            } else {
                // Text runs up to the next tag-looking '<'
                let end = rest
                    .match_indices('<')
                    .map(|(i, _)| i)
                    .find(|&i| i > 0)
                    .unwrap_or(rest.len());
                let text = decode_entities(&rest[..end]);
                let node = doc.create_text(&text);
                doc.append_child(current, node)?;
                self.pos += end;
            }
        }
        Ok(())
    }

    /// Parse `<tag attr=...>` starting at `self.pos`.
    fn open_tag(&mut self, doc: &mut Document) -> Result<(NodeId, String, bool)> {
        let start = self.pos;
        self.pos += 1;
        let tag = self.read_name();
        let element = doc.create_element(&tag);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                self.pos = start;
                return Err(self.error(format!("unterminated <{tag}> tag")));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((element, tag, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((element, tag, false));
            }

            let name = self.read_name();
            if name.is_empty() {
                // Skip junk such as a lone '/'
                self.pos += rest.chars().next().map(char::len_utf8).unwrap_or(1);
                continue;
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_value()?
            } else {
                String::new()
            };
            doc.set_attribute(element, &name, &value);
        }
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '=' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    fn read_value(&mut self) -> Result<String> {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &rest[1..];
            let end = body
                .find(quote)
                .ok_or_else(|| self.error("unterminated attribute value"))?;
            let value = decode_entities(&body[..end]);
            self.pos += end + 2;
            Ok(value)
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            let value = decode_entities(&rest[..end]);
            self.pos += end;
            Ok(value)
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

// =============================================================================
// Serialization
// =============================================================================

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Markup of `node` itself and everything under it.
pub fn outer_markup(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Markup of the children of `node`.
pub fn inner_markup(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        None => {}
        Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
        Some(NodeKind::Comment(text)) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Some(NodeKind::Document | NodeKind::Fragment) => {
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
        }
        Some(NodeKind::Element { tag, attrs }) => {
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if !attr.value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for &child in doc.children(node) {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}
