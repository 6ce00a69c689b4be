//! Runtime settings, module descriptors and project definitions
//!
//! This module provides:
//! - `Settings`: cache root, working directory and shell for the run
//! - `ModuleDescriptor` / `PromptSpec`: the parsed `zero-module.yml`
//! - `ModuleInstance` / `ProjectDefinition` / `ProjectContext`: what the caller owns

pub mod descriptor;
pub mod project;

use std::path::PathBuf;

pub use descriptor::{load_module_config, ModuleDescriptor, PromptSpec, TemplateConfig};
pub use project::{ModuleInstance, ProjectContext, ProjectDefinition};

/// Default root for cached remote modules, relative to the working directory
pub const DEFAULT_TEMPLATES_DIR: &str = "tmp/templates";

/// Environment variable overriding the templates cache root
pub const TEMPLATES_DIR_ENV: &str = "STENCIL_TEMPLATES_DIR";

/// File name of the module descriptor at a module's root
pub const MODULE_CONFIG_FILE: &str = "zero-module.yml";

/// Default project definition file read by the CLI
pub const PROJECT_CONFIG_FILE: &str = "stencil-project.yml";

/// Shell used to run Execute-mode prompt commands
pub const DEFAULT_SHELL: &str = "bash";

/// Settings shared by every module instantiated in one run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory holding one sub-directory per remote source
    pub templates_dir: PathBuf,

    /// Directory relative sources are resolved against
    pub working_dir: PathBuf,

    /// Shell binary for Execute-mode prompts (invoked as `<shell> -c <cmd>`)
    pub shell: String,
}

impl Settings {
    /// Build settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let templates_dir = std::env::var(TEMPLATES_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TEMPLATES_DIR));
        let working_dir = std::env::current_dir().unwrap_or_default();

        Self {
            templates_dir,
            working_dir,
            shell: DEFAULT_SHELL.to_string(),
        }
    }

    /// Override the templates cache root
    pub fn with_templates_dir(mut self, dir: PathBuf) -> Self {
        self.templates_dir = dir;
        self
    }

    /// Override the working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
