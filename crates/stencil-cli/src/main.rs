//! stencil CLI - Instantiate template modules into a project

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use stencil_core::tui::CreateArgs;
use stencil_core::{ModuleError, Settings, SourceKind, SourceResolver};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(about = "CLI for generating projects from template modules")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Instantiate every module of a project definition
    Create(CliCreateArgs),
    /// Show how a module source is classified and where it is cached
    Source(SourceArgs),
}

#[derive(Parser, Debug)]
pub struct CliCreateArgs {
    /// Project definition file
    #[arg(short, long, default_value = stencil_core::config::PROJECT_CONFIG_FILE)]
    pub project: PathBuf,

    /// Root directory for cached remote modules
    #[arg(long = "cache-dir", env = stencil_core::config::TEMPLATES_DIR_ENV)]
    pub cache_dir: Option<PathBuf>,
}

impl From<CliCreateArgs> for CreateArgs {
    fn from(args: CliCreateArgs) -> Self {
        CreateArgs {
            project: args.project,
            cache_dir: args.cache_dir,
        }
    }
}

#[derive(Parser, Debug)]
pub struct SourceArgs {
    /// Module source (local path, URL or shorthand such as github.com/org/repo)
    pub reference: String,

    /// Root directory for cached remote modules
    #[arg(long = "cache-dir", env = stencil_core::config::TEMPLATES_DIR_ENV)]
    pub cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_logging(args.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?args.command, "starting");

    let result = match args.command {
        Some(Command::Create(create_args)) => create(create_args.into()).await,
        Some(Command::Source(source_args)) => show_source(&source_args),
        // No subcommand provided, default to create behavior
        None => create(CreateArgs::default()).await,
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if let Err(e) = result {
        std::process::exit(report_error(&e));
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn create(args: CreateArgs) -> Result<()> {
    let report = stencil_core::run(args).await?;
    if !report.is_success() {
        anyhow::bail!("{} file(s) failed to render", report.failures.len());
    }
    Ok(())
}

fn show_source(args: &SourceArgs) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(dir) = &args.cache_dir {
        settings = settings.with_templates_dir(dir.clone());
    }
    let resolved = SourceResolver::from_settings(&settings).resolve(&args.reference)?;

    let kind = match resolved.kind {
        SourceKind::Local => "local".green(),
        SourceKind::Remote => "remote".cyan(),
    };
    println!("{:<10} {}", "kind".bold(), kind);
    println!("{:<10} {}", "uri".bold(), resolved.canonical);
    println!("{:<10} {}", "directory".bold(), resolved.local_dir.display());
    Ok(())
}

/// Print an error and pick the process exit code
fn report_error(error: &anyhow::Error) -> i32 {
    tracing::debug!(error = ?error, "command failed");
    match error.downcast_ref::<ModuleError>() {
        Some(ModuleError::UserAbort { field }) => {
            eprintln!("{} (while asking for '{}')", "Cancelled".yellow(), field);
            130
        }
        Some(module_error) if module_error.is_fatal() => {
            eprintln!("{} {:#}", "Fatal:".red().bold(), error);
            1
        }
        _ => {
            eprintln!("{} {:#}", "Error:".red().bold(), error);
            1
        }
    }
}
