//! Prompt construction from the diagram catalog.

use dgen_core::diagram::DiagramCatalog;
use dgen_core::{DgenError, Result};
use minijinja::{Environment, context};
use std::sync::Arc;

/// System and user prompt for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Renders catalog templates with minijinja.
pub struct PromptBuilder {
    catalog: Arc<DiagramCatalog>,
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new(catalog: Arc<DiagramCatalog>) -> Self {
        Self {
            catalog,
            env: Environment::new(),
        }
    }

    pub fn catalog(&self) -> &DiagramCatalog {
        &self.catalog
    }

    /// Fails with a validation error for an unknown diagram type.
    pub fn render(&self, diagram_type: &str, user_prompt: &str) -> Result<RenderedPrompt> {
        let definition = self.catalog.require(diagram_type)?;

        let system = self
            .env
            .render_str(
                &self.catalog.prompts.system_template,
                context! {
                    diagram_type => diagram_type,
                    description => &definition.description,
                    example => &definition.example,
                },
            )
            .map_err(|e| template_error("system", diagram_type, e))?;

        let user = self
            .env
            .render_str(
                self.catalog.user_template_for(definition),
                context! {
                    prompt => user_prompt,
                    diagram_type => diagram_type,
                    example => &definition.example,
                },
            )
            .map_err(|e| template_error("user", diagram_type, e))?;

        Ok(RenderedPrompt { system, user })
    }
}

fn template_error(kind: &str, diagram_type: &str, err: minijinja::Error) -> DgenError {
    DgenError::config(format!(
        "Failed to render {kind} template for '{diagram_type}': {err}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgen_core::diagram::{DiagramDefinition, PromptTemplates};
    use std::collections::BTreeMap;

    fn catalog() -> Arc<DiagramCatalog> {
        let mut definitions = BTreeMap::new();
        definitions.insert(
            "flowchart".to_string(),
            DiagramDefinition {
                description: "Boxes and arrows.".into(),
                example: "graph TD\n  A-->B".into(),
                prompt_template: None,
            },
        );
        definitions.insert(
            "sequence".to_string(),
            DiagramDefinition {
                description: String::new(),
                example: String::new(),
                prompt_template: Some("Sequence please: {{ prompt }}".into()),
            },
        );
        Arc::new(DiagramCatalog {
            prompts: PromptTemplates {
                system_template: "Make a {{ diagram_type }}. {{ description }} {{ example }}".into(),
                user_template: "{{ diagram_type }}: {{ prompt }}".into(),
            },
            definitions,
        })
    }

    #[test]
    fn renders_default_templates() {
        let prompt = PromptBuilder::new(catalog())
            .render("flowchart", "login flow")
            .unwrap();
        assert_eq!(prompt.system, "Make a flowchart. Boxes and arrows. graph TD\n  A-->B");
        assert_eq!(prompt.user, "flowchart: login flow");
    }

    #[test]
    fn per_type_template_wins() {
        let prompt = PromptBuilder::new(catalog()).render("sequence", "checkout").unwrap();
        assert_eq!(prompt.user, "Sequence please: checkout");
    }

    #[test]
    fn prompt_text_is_not_interpreted_as_template() {
        let prompt = PromptBuilder::new(catalog())
            .render("flowchart", "{{ secret }} and {% if x %}")
            .unwrap();
        assert_eq!(prompt.user, "flowchart: {{ secret }} and {% if x %}");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = PromptBuilder::new(catalog()).render("pie", "x").unwrap_err();
        assert!(matches!(err, DgenError::Validation(_)));
    }

    #[test]
    fn builtin_catalog_renders_every_type() {
        let builder = PromptBuilder::new(Arc::new(DiagramCatalog::builtin()));
        let types: Vec<String> = builder.catalog().diagram_types().map(String::from).collect();
        for diagram_type in types {
            let prompt = builder.render(&diagram_type, "anything").unwrap();
            assert!(prompt.system.contains("```mermaid"));
            assert!(prompt.user.contains("anything"));
        }
    }
}
