//! Module source resolution
//!
//! This module provides:
//! - Source classification (local path vs remote reference)
//! - Content-addressed cache directories for remote sources
//! - Remote fetching with progress reporting

pub mod detect;
pub mod fetcher;
pub mod progress;

use crate::config::Settings;
use crate::error::ModuleResult;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use std::path::{Path, PathBuf};

pub use detect::detect;
pub use fetcher::{Fetcher, HttpFetcher};
pub use progress::{ProgressSink, ProgressTracking};

/// Where a module source lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Already on disk; used in place
    Local,
    /// Fetched into the templates cache
    Remote,
}

/// Maps module sources to local directories
#[derive(Debug, Clone)]
pub struct SourceResolver {
    templates_dir: PathBuf,
    working_dir: PathBuf,
}

impl SourceResolver {
    pub fn new(templates_dir: PathBuf, working_dir: PathBuf) -> Self {
        Self {
            templates_dir,
            working_dir,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.templates_dir.clone(), settings.working_dir.clone())
    }

    /// Root of the remote module cache
    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Classify a source; detection failures are configuration errors
    pub fn classify(&self, source: &str) -> ModuleResult<SourceKind> {
        Ok(self.resolve(source)?.kind)
    }

    pub fn is_local(&self, source: &str) -> ModuleResult<bool> {
        Ok(self.classify(source)? == SourceKind::Local)
    }

    /// Local directory holding the module's files
    ///
    /// Local sources are returned unchanged. Remote sources map to
    /// `<templates_dir>/<base64(md5(source))>`.
    pub fn resolve_local_dir(&self, source: &str) -> ModuleResult<PathBuf> {
        Ok(self.resolve(source)?.local_dir)
    }

    /// Classify a source and compute its local directory in one pass
    pub fn resolve(&self, source: &str) -> ModuleResult<ResolvedSource> {
        let canonical = detect::detect(source, &self.working_dir)?;
        let (kind, local_dir) = if detect::is_file_uri(&canonical) {
            (SourceKind::Local, PathBuf::from(source))
        } else {
            (SourceKind::Remote, self.templates_dir.join(cache_key(source)))
        };

        tracing::debug!(source, %canonical, ?kind, dir = %local_dir.display(), "resolved module source");
        Ok(ResolvedSource {
            kind,
            canonical,
            local_dir,
        })
    }
}

/// A classified module source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    /// Canonical URI handed to the fetcher
    pub canonical: String,
    /// Directory the module's files live in (or will be fetched to)
    pub local_dir: PathBuf,
}

/// Cache directory name for a remote source
///
/// The URL-safe alphabet keeps the digest a single path segment.
pub fn cache_key(source: &str) -> String {
    let digest = md5::compute(source.as_bytes());
    URL_SAFE.encode(digest.0)
}
