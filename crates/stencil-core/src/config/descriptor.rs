//! Module descriptor types and parsing

use crate::error::{ModuleError, ModuleResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Template directory settings of a module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Directory (relative to the module root) holding the template files
    #[serde(default = "default_input_dir", alias = "input_dir")]
    pub input_dir: String,

    /// Output directory used when the module instance does not set one
    #[serde(default, alias = "output_dir")]
    pub output_dir: Option<String>,

    /// Accepted for compatibility; rendering is always strict
    #[serde(default, alias = "strict_mode")]
    pub strict_mode: bool,
}

fn default_input_dir() -> String {
    "templates".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: None,
            strict_mode: false,
        }
    }
}

/// How a prompt obtains its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Pick one of the declared options
    Select,
    /// Use the stdout of a shell command
    Execute,
    /// Free-text input
    Text,
}

/// A single parameter prompt declared by a module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptSpec {
    /// Key into the module params and the project context
    pub field: String,

    /// Display text (falls back to `field` when empty)
    #[serde(default)]
    pub label: String,

    /// Choices for a selection prompt
    #[serde(default)]
    pub options: Vec<String>,

    /// Shell command whose stdout becomes the value
    #[serde(default)]
    pub execute: String,
}

impl PromptSpec {
    /// Label shown to the user
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.field
        } else {
            &self.label
        }
    }

    /// Evaluation mode: options win over execute, execute over free text
    pub fn mode(&self) -> PromptMode {
        if !self.options.is_empty() {
            PromptMode::Select
        } else if !self.execute.is_empty() {
            PromptMode::Execute
        } else {
            PromptMode::Text
        }
    }
}

/// Parsed `zero-module.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Display name of the module
    #[serde(default)]
    pub name: String,

    /// Description of what the module generates
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// Template directory settings
    #[serde(default)]
    pub template: TemplateConfig,

    /// Parameter prompts, evaluated in declaration order
    #[serde(default)]
    pub prompts: Vec<PromptSpec>,

    /// Explicit list of template files relative to the input directory.
    /// When empty, every file under the input directory is rendered.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Load a module descriptor from a YAML file
pub fn load_module_config(path: &Path) -> ModuleResult<ModuleDescriptor> {
    let content = std::fs::read_to_string(path).map_err(|e| ModuleError::Descriptor {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ModuleError::Descriptor {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
