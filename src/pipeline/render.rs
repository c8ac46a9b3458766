//! Render strings - place bound view clones into the document.
//!
//! ```text
//! "detail > #main"    replace the contents of #main with a bound `detail`
//! "item >> ul.list"   append a bound `item` to ul.list
//! "badge >> "         (later segments only) append into the rendered view itself
//! ```
//!
//! The first segment selects its target in the document. Later segments
//! select within the view rendered by the first and honour their own
//! replace/append flag.

use std::rc::Rc;

use tracing::debug;

use crate::dom::{NodeId, Selector};
use crate::engine::Ui;
use crate::error::{Result, UiError};
use crate::template::Templator;
use crate::types::Value;

use super::ready::Pending;

/// One parsed `view > selector` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderString {
    pub view: String,
    pub append: bool,
    pub selector: String,
}

impl RenderString {
    /// Split at the first `>`; a second `>` right after it means append.
    pub fn parse(src: &str) -> Result<Self> {
        let idx = src
            .find('>')
            .ok_or_else(|| UiError::InvalidRenderString(src.to_string()))?;
        let view = src[..idx].trim().to_string();
        let rest = &src[idx + 1..];
        let (append, selector) = match rest.strip_prefix('>') {
            Some(after) => (true, after),
            None => (false, rest),
        };
        Ok(Self {
            view,
            append,
            selector: selector.trim().to_string(),
        })
    }
}

/// Split raw render arguments into render strings and the context.
///
/// A trailing non-text argument is the context; otherwise the context is an
/// empty record.
pub fn split_args(mut args: Vec<Value>) -> Result<(Vec<RenderString>, Value)> {
    let ctx = match args.last() {
        Some(Value::Text(_)) | None => Value::Map(Rc::default()),
        Some(_) => args.pop().unwrap_or_default(),
    };
    let strings = args
        .iter()
        .map(|arg| match arg {
            Value::Text(s) => RenderString::parse(s),
            other => Err(UiError::InvalidRenderString(other.to_display())),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((strings, ctx))
}

impl Ui {
    /// Render chained render strings against `ctx`.
    ///
    /// Before [`Ui::ready`] the call is queued and replayed in order once
    /// readiness fires.
    ///
    /// `ctx` is always the context, text included.
    pub fn render(&self, strings: &[&str], ctx: impl Into<Value>) -> Result<()> {
        let strings = strings
            .iter()
            .map(|s| RenderString::parse(s))
            .collect::<Result<Vec<_>>>()?;
        self.render_or_queue(strings, ctx.into())
    }

    /// Render from raw arguments: render strings, optionally followed by a
    /// non-text context (see [`split_args`]).
    pub fn render_args(&self, args: Vec<Value>) -> Result<()> {
        let (strings, ctx) = split_args(args)?;
        self.render_or_queue(strings, ctx)
    }

    fn render_or_queue(&self, strings: Vec<RenderString>, ctx: Value) -> Result<()> {
        if !self.is_ready() {
            debug!(strings = strings.len(), "render queued until ready");
            self.inner
                .readiness
                .borrow_mut()
                .push(Pending::Render(strings, ctx));
            return Ok(());
        }
        self.render_now(&strings, ctx)
    }

    pub(crate) fn render_now(&self, strings: &[RenderString], ctx: Value) -> Result<()> {
        let Some((first, rest)) = strings.split_first() else {
            return Ok(());
        };
        let templator = Templator::standard();

        let target = self
            .query(&first.selector)?
            .ok_or_else(|| UiError::TargetNotFound(first.selector.clone()))?;

        let shell = self.doc_mut().create_fragment();
        let result = self.render_into_shell(shell, first, rest, &ctx, &templator);
        if let Err(err) = result {
            self.discard(shell);
            return Err(err);
        }

        if !first.append {
            self.empty(target);
        }
        self.append_child(target, shell)?;
        self.discard(shell);
        debug!(view = %first.view, target = ?target, append = first.append, "rendered");
        Ok(())
    }

    fn render_into_shell(
        &self,
        shell: NodeId,
        first: &RenderString,
        rest: &[RenderString],
        ctx: &Value,
        templator: &Templator,
    ) -> Result<()> {
        let view = self.clone_view(&first.view)?;
        self.append_child(shell, view)?;
        self.bind(shell, Some(ctx.clone()), Some(templator.clone()))?;

        for segment in rest {
            let target = if segment.selector.is_empty() {
                shell
            } else {
                let selector = Selector::parse(&segment.selector)?;
                self.doc()
                    .query_selector(shell, &selector)
                    .ok_or_else(|| UiError::TargetNotFound(segment.selector.clone()))?
            };
            let sub = self.clone_view(&segment.view)?;
            self.bind(sub, Some(ctx.clone()), Some(templator.clone()))?;
            if !segment.append {
                self.empty(target);
            }
            self.append_child(target, sub)?;
            debug!(view = %segment.view, target = ?target, "sub view rendered");
        }
        Ok(())
    }

    /// Element under the root whose `id` is `id`.
    pub fn id(&self, id: &str) -> Option<NodeId> {
        let doc = self.doc();
        doc.element_by_id(doc.root(), id)
    }

    /// Children of `node`, text and comments included.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc().children(node).to_vec()
    }
}
