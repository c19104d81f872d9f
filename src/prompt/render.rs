//! Prompt Renderer - Render templates with context variables using Handlebars

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{Result, TestDriverError};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Missing variables render as empty
        handlebars.set_strict_mode(false);
        // Code goes through verbatim
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with any serializable context
    pub fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| TestDriverError::Template(format!("Failed to render template: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_simple() {
        let renderer = PromptRenderer::new();
        let result = renderer.render("Test {{name}}", &json!({ "name": "Money" })).unwrap();
        assert_eq!(result, "Test Money");
    }

    #[test]
    fn test_render_missing_variable_is_empty() {
        let renderer = PromptRenderer::new();
        let result = renderer.render("[{{missing}}]", &json!({})).unwrap();
        assert_eq!(result, "[]");
    }

    #[test]
    fn test_render_does_not_escape_code() {
        let renderer = PromptRenderer::new();
        let result = renderer
            .render("{{code}}", &json!({ "code": "if (a < b && c > d) { x = \"y\"; }" }))
            .unwrap();
        assert_eq!(result, "if (a < b && c > d) { x = \"y\"; }");
    }

    #[test]
    fn test_render_does_not_reparse_values() {
        let renderer = PromptRenderer::new();
        let result = renderer
            .render("{{code}}", &json!({ "code": "{{not_a_var}}" }))
            .unwrap();
        assert_eq!(result, "{{not_a_var}}");
    }

    #[test]
    fn test_render_invalid_template() {
        let renderer = PromptRenderer::new();
        let result = renderer.render("{{#if}}", &json!({}));
        assert!(matches!(result, Err(TestDriverError::Template(_))));
    }
}
