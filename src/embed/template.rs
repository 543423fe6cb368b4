//! Embedded text with typed placeholder substitution.
//!
//! Each template is paired with one variables type, so a page can't be
//! rendered with the script's variables by mistake.

use std::marker::PhantomData;

/// Placeholder substitution for one template.
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// `include_str!` content plus the variables type it expects.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }

    /// Unsubstituted text.
    pub fn raw(&self) -> &'static str {
        self.content
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}
