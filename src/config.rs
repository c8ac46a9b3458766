//! Engine configuration.
//!
//! Reserved names and defaults, overridable struct-literal style:
//!
//! ```ignore
//! let ui = Ui::with_config(UiConfig {
//!     render_tag: "include".into(),
//!     ..Default::default()
//! });
//! ```

use crate::template::Templator;

/// Reserved markup names and engine defaults.
#[derive(Clone, Debug)]
pub struct UiConfig {
    /// Attribute marking an element as a view (`<tr l-view="row">`).
    pub view_attribute: String,
    /// Wrapper tag whose children form a view (`<l-view name="row">`).
    pub view_tag: String,
    /// Subview insertion tag (`<render name="row">`).
    pub render_tag: String,
    /// Attribute naming the view on `view_tag` and `render_tag`.
    pub name_attribute: String,
    /// Elements the bind engine never enters.
    pub skip_tags: Vec<String>,
    /// Templator used when no ancestor supplies one.
    pub default_templator: Templator,
    /// Install the built-in attribute processors and mediators.
    pub install_defaults: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            view_attribute: "l-view".into(),
            view_tag: "l-view".into(),
            render_tag: "render".into(),
            name_attribute: "name".into(),
            skip_tags: vec!["script".into()],
            default_templator: Templator::standard(),
            install_defaults: true,
        }
    }
}

impl UiConfig {
    pub(crate) fn is_skipped(&self, tag: &str) -> bool {
        self.skip_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = UiConfig::default();
        assert_eq!(cfg.view_attribute, "l-view");
        assert_eq!(cfg.render_tag, "render");
        assert!(cfg.install_defaults);
        assert!(cfg.is_skipped("SCRIPT"));
        assert!(!cfg.is_skipped("div"));
    }

    #[test]
    fn test_struct_update_override() {
        let cfg = UiConfig {
            render_tag: "include".into(),
            ..Default::default()
        };
        assert_eq!(cfg.render_tag, "include");
        assert_eq!(cfg.name_attribute, "name");
    }
}
