//! Prompt framing for build and modify requests

use crate::config::PromptOverrides;
use crate::error::Result;
use tera::{Context, Tera};

const BUILD: &str = "build";
const MODIFY: &str = "modify";

pub const DEFAULT_BUILD_TEMPLATE: &str = r#"You are CrucibAI. Create a complete React application for: "{{ instruction }}"

Requirements:
- Use React functional components with hooks
- Use Tailwind CSS for styling
- Make it fully functional and modern
- Include ALL necessary imports

Respond with ONLY the complete code for {{ path }}. No explanations."#;

pub const DEFAULT_MODIFY_TEMPLATE: &str = r#"You are CrucibAI. Apply this change to the React application: "{{ instruction }}"

Current code of {{ path }}:
{{ current }}

Requirements:
- Keep everything that the change does not touch
- Use React functional components with hooks
- Use Tailwind CSS for styling
- Include ALL necessary imports

Respond with ONLY the complete updated code. No explanations."#;

/// Renders the instruction into the text sent to the generation endpoint.
///
/// Templates are Tera; `instruction` and `path` are available to both,
/// `current` (the primary file's content) only to the modify template.
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        Self::with_overrides(&PromptOverrides::default())
    }

    pub fn with_overrides(overrides: &PromptOverrides) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]); // generated code must not be html-escaped

        tera.add_raw_template(
            BUILD,
            overrides.build.as_deref().unwrap_or(DEFAULT_BUILD_TEMPLATE),
        )?;
        tera.add_raw_template(
            MODIFY,
            overrides.modify.as_deref().unwrap_or(DEFAULT_MODIFY_TEMPLATE),
        )?;

        Ok(Self { tera })
    }

    pub fn render_build(&self, instruction: &str, path: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("instruction", instruction);
        context.insert("path", path);
        Ok(self.tera.render(BUILD, &context)?)
    }

    pub fn render_modify(&self, instruction: &str, path: &str, current: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("instruction", instruction);
        context.insert("path", path);
        context.insert("current", current);
        Ok(self.tera.render(MODIFY, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_has_only_instruction() {
        let engine = PromptEngine::new().unwrap();
        let prompt = engine.render_build("a todo app", "src/App.jsx").unwrap();
        assert!(prompt.contains("\"a todo app\""));
        assert!(!prompt.contains("Current code"));
    }

    #[test]
    fn test_modify_prompt_embeds_current_file() {
        let engine = PromptEngine::new().unwrap();
        let prompt = engine
            .render_modify("make it blue", "src/App.jsx", "const a = <b>1</b>;")
            .unwrap();
        assert!(prompt.contains("make it blue"));
        assert!(prompt.contains("const a = <b>1</b>;"));
    }

    #[test]
    fn test_overrides_replace_templates() {
        let overrides = PromptOverrides {
            build: Some("BUILD {{ instruction }}".to_string()),
            modify: None,
        };
        let engine = PromptEngine::with_overrides(&overrides).unwrap();
        assert_eq!(
            engine.render_build("x", "src/App.jsx").unwrap(),
            "BUILD x"
        );
    }

    #[test]
    fn test_broken_override_is_rejected() {
        let overrides = PromptOverrides {
            build: Some("{{ unclosed".to_string()),
            modify: None,
        };
        assert!(PromptEngine::with_overrides(&overrides).is_err());
    }
}
