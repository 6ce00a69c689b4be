//! Module instantiation: resolve, load, prompt, render
//!
//! ```ignore
//! let mut module = TemplateModule::load(instance, &resolver, &fetcher, &progress).await?;
//! module.prompt_params(&mut ctx, &mut prompter, &runner)?;
//! module.render(&ctx, &templator)?;
//! let report = templator.wait().await;
//! ```

pub mod params;

use crate::config::{
    load_module_config, ModuleDescriptor, ModuleInstance, ProjectContext, MODULE_CONFIG_FILE,
};
use crate::error::{ModuleError, ModuleResult};
use crate::prompt::{CommandRunner, Prompter};
use crate::source::{Fetcher, ProgressSink, SourceKind, SourceResolver};
use crate::templates::{template_data, TemplateRef, Templator};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use params::{collect_params, sanitize_prompt_result};

/// A module instance together with its loaded descriptor
#[derive(Debug, Clone)]
pub struct TemplateModule {
    pub instance: ModuleInstance,
    pub descriptor: ModuleDescriptor,
    source_dir: PathBuf,
}

impl TemplateModule {
    /// Resolve the instance's source, fetch it if remote, and load its descriptor
    pub async fn load(
        instance: ModuleInstance,
        resolver: &SourceResolver,
        fetcher: &dyn Fetcher,
        progress: &dyn ProgressSink,
    ) -> ModuleResult<Self> {
        let resolved = resolver.resolve(&instance.source)?;

        if resolved.kind == SourceKind::Remote {
            fetcher
                .fetch(&resolved.canonical, &resolved.local_dir, progress)
                .await?;
        }

        let descriptor = load_module_config(&resolved.local_dir.join(MODULE_CONFIG_FILE))?;
        tracing::info!(
            module = %descriptor.name,
            source = %instance.source,
            "loaded module"
        );

        Ok(Self {
            instance,
            descriptor,
            source_dir: resolved.local_dir,
        })
    }

    /// Build a module from parts already on hand
    pub fn from_parts(
        instance: ModuleInstance,
        descriptor: ModuleDescriptor,
        source_dir: PathBuf,
    ) -> Self {
        Self {
            instance,
            descriptor,
            source_dir,
        }
    }

    /// Directory the module's files were resolved to
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Fill in missing params from the project context, prompts and commands
    pub fn prompt_params(
        &mut self,
        ctx: &mut ProjectContext,
        prompter: &mut dyn Prompter,
        runner: &dyn CommandRunner,
    ) -> ModuleResult<()> {
        collect_params(
            &self.descriptor.prompts,
            &mut self.instance.params,
            ctx,
            prompter,
            runner,
        )
    }

    /// Where rendered files go
    pub fn output_dir(&self) -> PathBuf {
        self.instance
            .output
            .clone()
            .or_else(|| self.descriptor.template.output_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Template files relative to the input directory
    pub fn template_files(&self) -> ModuleResult<Vec<String>> {
        if !self.descriptor.files.is_empty() {
            return Ok(self.descriptor.files.clone());
        }

        let input_dir = self.input_dir();
        if !input_dir.is_dir() {
            tracing::debug!(
                module = %self.descriptor.name,
                input = %input_dir.display(),
                "no template directory, nothing to render"
            );
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&input_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ModuleError::Descriptor {
                path: input_dir.clone(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&input_dir)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            files.push(relative);
        }

        Ok(files)
    }

    /// Dispatch one write per template file into the output directory
    ///
    /// Returns the number of dispatched writes; join them with
    /// [`Templator::wait`].
    pub fn render(&self, ctx: &ProjectContext, templator: &Templator) -> ModuleResult<usize> {
        let input_dir = self.input_dir();
        let output_dir = self.output_dir();
        let data = template_data(&self.instance.params, ctx);
        let files = self.template_files()?;

        for file in &files {
            let template = TemplateRef::File(input_dir.join(file));
            if self.instance.overwrite {
                templator.template_file_and_overwrite(&output_dir, file, template, &data);
            } else {
                templator.template_file_if_absent(&output_dir, file, template, &data);
            }
        }

        tracing::debug!(
            module = %self.descriptor.name,
            files = files.len(),
            output = %output_dir.display(),
            "dispatched module templates"
        );
        Ok(files.len())
    }

    fn input_dir(&self) -> PathBuf {
        self.source_dir.join(&self.descriptor.template.input_dir)
    }
}
