//! Project definition, module instances and the shared project context

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One concrete use of a module within a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleInstance {
    /// Where the module's files live (path or remote reference)
    pub source: String,

    /// Already-known parameter values; filled in by prompting
    #[serde(default)]
    pub params: HashMap<String, String>,

    /// Replace existing output files instead of skipping them
    #[serde(default)]
    pub overwrite: bool,

    /// Output directory for rendered files
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ModuleInstance {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// Named module entry in a project definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectModule {
    pub name: String,

    #[serde(flatten)]
    pub instance: ModuleInstance,
}

/// Project definition file (`stencil-project.yml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefinition {
    pub name: String,

    /// Values seeded into the project context before any prompt runs
    #[serde(default)]
    pub context: HashMap<String, String>,

    /// Modules, processed in file order
    #[serde(default)]
    pub modules: Vec<ProjectModule>,
}

impl ProjectDefinition {
    /// Read a project definition from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse project definition {}", path.display()))
    }

    /// Initial project context: `projectName` plus the declared context values
    pub fn initial_context(&self) -> ProjectContext {
        let mut ctx = ProjectContext::new();
        if !self.name.is_empty() {
            ctx.insert("projectName", &self.name);
        }
        for (key, value) in &self.context {
            ctx.insert(key, value);
        }
        ctx
    }
}

/// Cross-module store of already-resolved parameter values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectContext(HashMap<String, String>);

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-empty entries as `(KEY, VALUE)` pairs for a child process environment
    pub fn env_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.0
    }
}

impl From<HashMap<String, String>> for ProjectContext {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}
