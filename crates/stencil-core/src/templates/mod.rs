//! Template rendering and concurrent file writing
//!
//! This module provides:
//! - Tera rendering with the `Title` / `ToLower` helper filters
//! - The `Templator`: one task per output file, joined per batch
//! - Overwrite vs preserve policy for existing output files

pub mod renderer;
pub mod writer;

pub use renderer::{render, template_data, title_case};
pub use writer::{BatchReport, FileOutcome, TemplateRef, Templator, WriteMode};
