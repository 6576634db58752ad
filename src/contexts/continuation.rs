use serde::Serialize;
use std::fmt;

use crate::data::FileRegistry;

/// Default prompt asking the model to carry on from the files written so far.
pub const DEFAULT_CONTINUATION_TEMPLATE: &str = "
I've generated the following files so far:
{{input.files}}

Please continue the code generation for the project. Focus on:
1. Implementing any missing functionality
2. Improving existing code if needed
3. Adding any necessary files that haven't been created yet
4. Ensuring everything works together cohesively

You can refer to the files I've already created. Please provide the next set of files or updates.
";

/// Errors that can occur while populating a continuation template
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateError {
    MissingMandatoryPlaceholder(String),
    InvalidPlaceholderPath(String),
    Serialization(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TemplateError::MissingMandatoryPlaceholder(ph) => {
                write!(f, "Required placeholder '{}' could not be resolved", ph)
            }
            TemplateError::InvalidPlaceholderPath(path) => {
                write!(f, "Invalid path '{}' in placeholder", path)
            }
            TemplateError::Serialization(details) => {
                write!(f, "Failed to serialize template input: {}", details)
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Trait for loading a continuation template from somewhere outside the session
pub trait PromptRegistry {
    fn continuation_template(&self) -> Result<ContinuationTemplate, crate::registries::PromptRegistryError>;
}

/// Values a continuation template can refer to as `{{input.<name>}}`
#[derive(Debug, Serialize)]
struct ContinuationInput {
    /// `path: summary` lines in registry order
    files: String,
    file_count: usize,
    /// The round this prompt will start
    round: usize,
}

impl ContinuationInput {
    fn new(registry: &FileRegistry, round: usize) -> Self {
        Self {
            files: registry.render(),
            file_count: registry.len(),
            round,
        }
    }
}

/// Template for the prompt that starts every round after the first.
///
/// Placeholders are `{{input.files}}`, `{{input.file_count}}` and
/// `{{input.round}}`. A trailing `?` (`{{input.note?}}`) renders an
/// unresolvable placeholder as empty instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationTemplate {
    template: String,
}

impl Default for ContinuationTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_CONTINUATION_TEMPLATE.to_string(),
        }
    }
}

impl ContinuationTemplate {
    /// Parses a template, rejecting placeholders that can never resolve.
    pub fn new(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        replace_placeholders(&template, &ContinuationInput::new(&FileRegistry::new(), 1))?;
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Renders the prompt for `round` from the current registry.
    pub fn render(&self, registry: &FileRegistry, round: usize) -> String {
        let input = ContinuationInput::new(registry, round);
        match replace_placeholders(&self.template, &input) {
            Ok(prompt) => prompt,
            Err(e) => {
                // Unreachable for templates built through `new`.
                tracing::warn!("Continuation template failed ({}), using the default", e);
                replace_placeholders(DEFAULT_CONTINUATION_TEMPLATE, &input).unwrap_or(input.files)
            }
        }
    }
}

fn replace_placeholders<T: Serialize>(template: &str, input: &T) -> Result<String, TemplateError> {
    let input_json =
        serde_json::to_value(input).map_err(|e| TemplateError::Serialization(e.to_string()))?;

    let mut result = template.to_string();
    let mut offset = 0;

    while let Some(start) = result[offset..].find("{{") {
        let start = offset + start;
        let Some(end_pos) = result[start..].find("}}") else {
            break;
        };
        let end = start + end_pos;

        let placeholder = result[start + 2..end].trim();
        let (path, is_optional) = match placeholder.strip_suffix('?') {
            Some(path) => (path, true),
            None => (placeholder, false),
        };

        match resolve_path(&input_json, path)? {
            Some(value) => {
                let replacement = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                result.replace_range(start..end + 2, &replacement);
                offset = start + replacement.len();
            }
            None if is_optional => {
                result.replace_range(start..end + 2, "");
                offset = start;
            }
            None => {
                return Err(TemplateError::MissingMandatoryPlaceholder(path.to_string()));
            }
        }
    }

    Ok(result)
}

/// Resolves a dotted `input.a.b` path in the serialized input.
fn resolve_path<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Result<Option<&'a serde_json::Value>, TemplateError> {
    let parts: Vec<&str> = path.split('.').collect();

    if parts.first() != Some(&"input") {
        return Err(TemplateError::InvalidPlaceholderPath(path.to_string()));
    }

    let mut current = value;
    for part in &parts[1..] {
        match current.get(part) {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}
