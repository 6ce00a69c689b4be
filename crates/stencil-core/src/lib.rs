//! Stencil Core - Module resolution and code generation for project scaffolding
//!
//! A project is assembled from template modules. Each module lives in a
//! directory holding a `zero-module.yml` descriptor plus its template files,
//! either on local disk or behind a remote reference that is fetched into a
//! content-addressed cache.
//!
//! # Architecture
//!
//! - **Sources** - Classify module sources, map them to cache directories, fetch remote ones
//! - **Parameters** - Collect values for a module's prompts, shared through a project context
//! - **Templating** - Render template files concurrently with overwrite or preserve policies
//! - **CLI/TUI Interface** - Optional cliclack-based prompts and orchestration (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompter and the `run` entrypoint
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use stencil_core::{HttpFetcher, ModuleInstance, ProgressTracking, Settings, SourceResolver};
//! use stencil_core::{ProjectContext, TemplateModule, Templator};
//!
//! let resolver = SourceResolver::from_settings(&Settings::from_env());
//! let module = TemplateModule::load(
//!     ModuleInstance::new("github.com/acme/api-module"),
//!     &resolver,
//!     &HttpFetcher::default(),
//!     &ProgressTracking::new(),
//! )
//! .await?;
//!
//! let ctx = ProjectContext::new();
//! let templator = Templator::new();
//! module.render(&ctx, &templator)?;
//! let report = templator.wait().await;
//! ```

pub mod config;
pub mod error;
pub mod module;
pub mod prompt;
pub mod source;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{
    load_module_config, ModuleDescriptor, ModuleInstance, ProjectContext, ProjectDefinition,
    PromptSpec, Settings,
};
pub use error::{ModuleError, ModuleResult};
pub use module::{collect_params, TemplateModule};
pub use prompt::{CommandRunner, Prompter, ShellCommandRunner};
pub use source::{
    cache_key, Fetcher, HttpFetcher, ProgressSink, ProgressTracking, ResolvedSource, SourceKind,
    SourceResolver,
};
pub use templates::{BatchReport, Templator, WriteMode};

#[cfg(feature = "tui")]
pub use tui::run;
