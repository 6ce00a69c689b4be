//! Interactive project creation: every module of a project definition is
//! loaded, prompted for and rendered, then all writes are joined.

use super::prompts::CliclackPrompter;
use crate::config::{ProjectContext, ProjectDefinition, Settings, PROJECT_CONFIG_FILE};
use crate::module::TemplateModule;
use crate::prompt::ShellCommandRunner;
use crate::source::{HttpFetcher, ProgressTracking, SourceKind, SourceResolver};
use crate::templates::{BatchReport, Templator};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// CLI arguments for the create command
#[derive(Debug, Clone)]
pub struct CreateArgs {
    /// Project definition file
    pub project: PathBuf,

    /// Override for the remote module cache root
    pub cache_dir: Option<PathBuf>,
}

impl Default for CreateArgs {
    fn default() -> Self {
        Self {
            project: PathBuf::from(PROJECT_CONFIG_FILE),
            cache_dir: None,
        }
    }
}

/// Run the CLI with interactive prompts
///
/// In-flight writes are always joined before returning, even when a later
/// module fails.
pub async fn run(args: CreateArgs) -> Result<BatchReport> {
    let project = ProjectDefinition::load(&args.project)?;
    cliclack::intro(format!("stencil: {}", project.name))?;

    let mut settings = Settings::from_env();
    if let Some(dir) = args.cache_dir {
        settings = settings.with_templates_dir(dir);
    }

    let templator = Templator::new();
    let mut ctx = project.initial_context();
    let result = instantiate_modules(&project, &settings, &mut ctx, &templator).await;

    let spinner = cliclack::spinner();
    spinner.start("Rendering files...");
    let report = templator.wait().await;
    spinner.stop(format!(
        "Wrote {} file(s), skipped {}, {} failed",
        report.written.len(),
        report.skipped.len(),
        report.failures.len()
    ));

    for skipped in &report.skipped {
        cliclack::log::remark(format!("{} already exists. skipping.", skipped.display()))?;
    }
    for failure in &report.failures {
        cliclack::log::warning(failure.to_string())?;
    }

    result?;
    cliclack::outro("Project generated")?;
    Ok(report)
}

async fn instantiate_modules(
    project: &ProjectDefinition,
    settings: &Settings,
    ctx: &mut ProjectContext,
    templator: &Templator,
) -> Result<()> {
    let resolver = SourceResolver::from_settings(settings);
    let fetcher = HttpFetcher::default();
    let progress = ProgressTracking::new();
    let runner = ShellCommandRunner::new(settings.shell.as_str());
    let mut prompter = CliclackPrompter;

    for entry in &project.modules {
        cliclack::log::step(format!("Module: {}", entry.name))?;

        let resolved = resolver.resolve(&entry.instance.source)?;
        let spinner = cliclack::spinner();
        match resolved.kind {
            SourceKind::Remote => spinner.start(format!("Fetching {}...", resolved.canonical)),
            SourceKind::Local => spinner.start(format!("Loading {}...", entry.instance.source)),
        }

        let loaded =
            TemplateModule::load(entry.instance.clone(), &resolver, &fetcher, &progress).await;
        let mut module = match loaded {
            Ok(module) => {
                spinner.stop(format!(
                    "{} ({})",
                    display_name(&module, &entry.name),
                    module.source_dir().display()
                ));
                module
            }
            Err(e) => {
                spinner.stop(format!("Failed to load {}", entry.name));
                return Err(e)
                    .with_context(|| format!("Module '{}' could not be loaded", entry.name));
            }
        };

        tracing::debug!(
            module = %entry.name,
            chunks = progress.attempts(&resolved.canonical),
            "fetch progress"
        );

        module.prompt_params(ctx, &mut prompter, &runner)?;
        module.render(ctx, templator)?;
    }

    Ok(())
}

fn display_name<'a>(module: &'a TemplateModule, fallback: &'a str) -> &'a str {
    if module.descriptor.name.is_empty() {
        fallback
    } else {
        &module.descriptor.name
    }
}
