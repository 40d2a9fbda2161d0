use crate::error::{DgenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default system prompt. Receives `diagram_type`, `description` and `example`.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "\
You are an expert at producing Mermaid diagrams.
Produce a {{ diagram_type }} diagram. {{ description }}
Reply with exactly one fenced code block that starts with ```mermaid and ends with ```.
{% if example %}Follow the style of this example:
{{ example }}
{% endif %}";

/// Default user prompt. Receives `prompt`, `diagram_type` and `example`.
pub const DEFAULT_USER_TEMPLATE: &str =
    "Create a {{ diagram_type }} diagram for the following request:\n{{ prompt }}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub system_template: String,
    pub user_template: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system_template: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            user_template: DEFAULT_USER_TEMPLATE.to_string(),
        }
    }
}

/// One supported diagram type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example: String,
    /// Replaces the catalog's user template for this type.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

/// Supported diagram types and the templates used to prompt for them.
///
/// Stored as `diagram-definitions.toml`:
///
/// ```toml
/// [prompts]
/// system_template = "..."
/// user_template = "..."
///
/// [definitions.flowchart]
/// description = "..."
/// example = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramCatalog {
    #[serde(default)]
    pub prompts: PromptTemplates,
    pub definitions: BTreeMap<String, DiagramDefinition>,
}

impl DiagramCatalog {
    /// Catalog used when no definitions file exists.
    pub fn builtin() -> Self {
        let entries = [
            (
                "flowchart",
                "Show steps and decisions connected by arrows.",
                "graph TD\n    A[Start] --> B{Decision}\n    B -->|Yes| C[Do it]\n    B -->|No| D[Skip]",
            ),
            (
                "sequence",
                "Show messages exchanged between participants over time.",
                "sequenceDiagram\n    Alice->>Bob: Hello\n    Bob-->>Alice: Hi",
            ),
            (
                "class",
                "Show classes with their attributes, methods and relationships.",
                "classDiagram\n    Animal <|-- Dog\n    Animal : +String name",
            ),
            (
                "state",
                "Show states and the transitions between them.",
                "stateDiagram-v2\n    [*] --> Idle\n    Idle --> Running\n    Running --> [*]",
            ),
            (
                "er",
                "Show entities and their relationships.",
                "erDiagram\n    CUSTOMER ||--o{ ORDER : places",
            ),
            (
                "gantt",
                "Show tasks on a timeline.",
                "gantt\n    title Plan\n    dateFormat YYYY-MM-DD\n    Design :a1, 2024-01-01, 7d",
            ),
            (
                "mindmap",
                "Show ideas branching from a central topic.",
                "mindmap\n  root((Topic))\n    Idea A\n    Idea B",
            ),
        ];

        let definitions = entries
            .into_iter()
            .map(|(name, description, example)| {
                (
                    name.to_string(),
                    DiagramDefinition {
                        description: description.to_string(),
                        example: example.to_string(),
                        prompt_template: None,
                    },
                )
            })
            .collect();

        Self {
            prompts: PromptTemplates::default(),
            definitions,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(content)?;
        if catalog.definitions.is_empty() {
            return Err(DgenError::config("diagram catalog defines no diagram types"));
        }
        Ok(catalog)
    }

    pub fn contains(&self, diagram_type: &str) -> bool {
        self.definitions.contains_key(diagram_type)
    }

    pub fn get(&self, diagram_type: &str) -> Option<&DiagramDefinition> {
        self.definitions.get(diagram_type)
    }

    /// Looks up a type, failing with the error reported to callers for an
    /// unknown one.
    pub fn require(&self, diagram_type: &str) -> Result<&DiagramDefinition> {
        self.get(diagram_type).ok_or_else(|| {
            DgenError::validation(format!("Unsupported diagram type: {diagram_type}"))
        })
    }

    /// User template for a type: its own `prompt_template` or the catalog default.
    pub fn user_template_for<'a>(&'a self, definition: &'a DiagramDefinition) -> &'a str {
        definition
            .prompt_template
            .as_deref()
            .unwrap_or(&self.prompts.user_template)
    }

    pub fn diagram_types(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

impl Default for DiagramCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
