use crate::contexts::{ContinuationTemplate, PromptRegistry, TemplateError};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Errors that can occur while loading a continuation template
#[derive(Debug)]
pub enum PromptRegistryError {
    NotFound(String),
    InvalidTemplate(String),
    Template(TemplateError),
}

impl fmt::Display for PromptRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PromptRegistryError::NotFound(path) => {
                write!(f, "Prompt template file '{}' not found", path)
            }
            PromptRegistryError::InvalidTemplate(details) => {
                write!(f, "Prompt template file is invalid: {}", details)
            }
            PromptRegistryError::Template(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PromptRegistryError {}

impl From<TemplateError> for PromptRegistryError {
    fn from(e: TemplateError) -> Self {
        PromptRegistryError::Template(e)
    }
}

/// File-based implementation of PromptRegistry
/// Loads the continuation prompt from the `continuation_prompt` field of a YAML file
#[derive(Clone)]
pub struct FilePromptRegistry {
    template_path: PathBuf,
}

impl FilePromptRegistry {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }
}

impl PromptRegistry for FilePromptRegistry {
    fn continuation_template(&self) -> Result<ContinuationTemplate, PromptRegistryError> {
        if !self.template_path.exists() {
            return Err(PromptRegistryError::NotFound(
                self.template_path.display().to_string(),
            ));
        }

        let content = fs::read_to_string(&self.template_path).map_err(|e| {
            PromptRegistryError::InvalidTemplate(format!(
                "Failed to read {}: {}",
                self.template_path.display(),
                e
            ))
        })?;

        let prompt = extract_continuation_prompt(&content)?;
        Ok(ContinuationTemplate::new(prompt)?)
    }
}

fn extract_continuation_prompt(yaml_content: &str) -> Result<String, PromptRegistryError> {
    use yaml_rust::YamlLoader;

    let docs = YamlLoader::load_from_str(yaml_content)
        .map_err(|e| PromptRegistryError::InvalidTemplate(format!("Invalid YAML: {}", e)))?;

    let Some(doc) = docs.first() else {
        return Err(PromptRegistryError::InvalidTemplate(
            "Empty YAML document".to_string(),
        ));
    };

    doc["continuation_prompt"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PromptRegistryError::InvalidTemplate(
                "No continuation_prompt field found".to_string(),
            )
        })
}
