//! Templators - map a literal template string and a context to a value.
//!
//! The standard templator understands:
//! - `$$` - the whole context
//! - `$name`, `$a.b.c` - a path lookup
//! - `${a.b}` - a braced path, for tokens followed by identifier characters
//!
//! A template made of exactly one token yields the raw value, so lists,
//! dictionaries, functions and nodes pass through untouched. Anything else
//! is interpolated into text.

use std::fmt;
use std::rc::Rc;

use crate::types::Value;

/// Pluggable template function, inherited down the tree during bind.
#[derive(Clone)]
pub struct Templator(Rc<dyn Fn(&str, &Value) -> Value>);

impl Templator {
    pub fn new(f: impl Fn(&str, &Value) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// The `$path` templator.
    pub fn standard() -> Self {
        Self::new(standard_template)
    }

    /// Templator returning every string verbatim.
    pub fn identity() -> Self {
        Self::new(|src, _| Value::from(src))
    }

    pub fn apply(&self, template: &str, ctx: &Value) -> Value {
        (self.0)(template, ctx)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Templator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Templator({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Standard templator
// =============================================================================

enum Piece<'a> {
    Literal(&'a str),
    Token(&'a str),
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Split a template into literal runs and `$` tokens.
fn tokenize(src: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(off) = src[pos..].find('$') {
        let at = pos + off;
        let after = &src[at + 1..];

        let token = if after.starts_with('$') {
            Some(("$", 2))
        } else if let Some(body) = after.strip_prefix('{') {
            body.find('}').map(|end| (&body[..end], end + 3))
        } else {
            let len = after
                .find(|c: char| !is_path_char(c))
                .unwrap_or(after.len());
            // A trailing dot ends the sentence, not the path
            let path = after[..len].trim_end_matches('.');
            (!path.is_empty() && !path.starts_with('.')).then_some((path, path.len() + 1))
        };

        match token {
            Some((path, consumed)) => {
                if at > literal_start {
                    pieces.push(Piece::Literal(&src[literal_start..at]));
                }
                pieces.push(Piece::Token(path));
                pos = at + consumed;
                literal_start = pos;
            }
            None => pos = at + 1,
        }
    }
    if literal_start < src.len() {
        pieces.push(Piece::Literal(&src[literal_start..]));
    }
    pieces
}

fn lookup(ctx: &Value, path: &str) -> Value {
    if path == "$" {
        ctx.clone()
    } else {
        ctx.path(path)
    }
}

fn standard_template(src: &str, ctx: &Value) -> Value {
    let pieces = tokenize(src);
    match pieces.as_slice() {
        [] => Value::from(src),
        [Piece::Token(path)] => lookup(ctx, path),
        _ => {
            let mut out = String::with_capacity(src.len());
            for piece in &pieces {
                match piece {
                    Piece::Literal(text) => out.push_str(text),
                    Piece::Token(path) => out.push_str(&lookup(ctx, path).to_display()),
                }
            }
            Value::from(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Value {
        Value::record([
            ("name", Value::from("Ada")),
            ("age", Value::from(36)),
            ("langs", Value::list(["en", "fr"])),
        ])
    }

    #[test]
    fn test_whole_context_token() {
        let t = Templator::standard();
        assert_eq!(t.apply("$$", &Value::from(7)), Value::from(7));
        assert_eq!(t.apply("<$$>", &Value::from(7)), Value::from("<7>"));
    }

    #[test]
    fn test_single_token_keeps_raw_value() {
        let t = Templator::standard();
        let ctx = person();
        assert_eq!(t.apply("$langs", &ctx), ctx.get("langs"));
        assert_eq!(t.apply("$age", &ctx), Value::from(36));
    }

    #[test]
    fn test_interpolation() {
        let t = Templator::standard();
        let ctx = person();
        assert_eq!(
            t.apply("$name is $age.", &ctx),
            Value::from("Ada is 36.")
        );
        assert_eq!(t.apply("${name}s", &ctx), Value::from("Adas"));
        assert_eq!(t.apply("first: $langs.0", &ctx), Value::from("first: en"));
    }

    #[test]
    fn test_literal_dollars_and_missing_paths() {
        let t = Templator::standard();
        let ctx = person();
        assert_eq!(t.apply("costs $ 5", &ctx), Value::from("costs $ 5"));
        assert_eq!(t.apply("plain", &ctx), Value::from("plain"));
        assert!(t.apply("$nope", &ctx).is_null());
        assert_eq!(t.apply("[$nope]", &ctx), Value::from("[]"));
    }

    #[test]
    fn test_reads_through_signals() {
        let t = Templator::standard();
        let name = spark_signals::signal(Value::from("Grace"));
        let ctx = Value::record([("name", Value::Signal(name.clone()))]);
        assert_eq!(t.apply("hi $name", &ctx), Value::from("hi Grace"));
        name.set(Value::from("Linus"));
        assert_eq!(t.apply("hi $name", &ctx), Value::from("hi Linus"));
    }
}
