//! Concurrent templated file writing
//!
//! Every file write runs as its own tokio task. The [`Templator`] tracks the
//! tasks of a batch and [`Templator::wait`] joins them, collecting a
//! [`BatchReport`]. A failing file never cancels its siblings.

use super::renderer;
use crate::error::ModuleError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tera::Context;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;

/// Policy for an output file that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Always (re)create the file
    Overwrite,
    /// Leave an existing file untouched
    Preserve,
}

/// Template text, inline or read from disk when the write runs
#[derive(Debug, Clone)]
pub enum TemplateRef {
    Inline(String),
    File(PathBuf),
}

/// Result of one file write
#[derive(Debug)]
pub enum FileOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
    Failed(ModuleError),
}

/// Outcome of every write joined by [`Templator::wait`]
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<ModuleError>,
}

impl BatchReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Written(path) => self.written.push(path),
            FileOutcome::Skipped(path) => self.skipped.push(path),
            FileOutcome::Failed(error) => self.failures.push(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failures.len()
    }
}

/// Dispatches templated file writes and joins them
///
/// Dispatching only needs `&self`, so one templator can be shared (e.g. in an
/// `Arc`) by several producers while other tasks wait on it. Writes to the
/// same path are applied in dispatch order.
#[derive(Default)]
pub struct Templator {
    tasks: Mutex<Vec<(PathBuf, JoinHandle<FileOutcome>)>>,
    last_write: Mutex<HashMap<PathBuf, oneshot::Receiver<()>>>,
    waiters: tokio::sync::Mutex<()>,
}

impl Templator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `template` into `dir/file_name`, replacing any existing file
    pub fn template_file_and_overwrite(
        &self,
        dir: &Path,
        file_name: &str,
        template: TemplateRef,
        data: &Context,
    ) {
        self.dispatch(dir, file_name, template, data, WriteMode::Overwrite);
    }

    /// Render `template` into `dir/file_name` unless the file already exists
    pub fn template_file_if_absent(
        &self,
        dir: &Path,
        file_name: &str,
        template: TemplateRef,
        data: &Context,
    ) {
        self.dispatch(dir, file_name, template, data, WriteMode::Preserve);
    }

    /// Spawn the write of one file; must be called within a tokio runtime
    pub fn dispatch(
        &self,
        dir: &Path,
        file_name: &str,
        template: TemplateRef,
        data: &Context,
        mode: WriteMode,
    ) {
        let path = dir.join(file_name);
        let (done_tx, done_rx) = oneshot::channel();
        let previous = lock(&self.last_write).insert(path.clone(), done_rx);

        let task_path = path.clone();
        let data = data.clone();
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                // Sender dropped means the earlier write is over either way
                let _ = previous.await;
            }

            let outcome = match write_templated_file(&task_path, &template, &data, mode).await {
                Ok(true) => {
                    tracing::info!("Finished templating: {}", task_path.display());
                    FileOutcome::Written(task_path)
                }
                Ok(false) => {
                    tracing::info!("{} already exists. skipping.", task_path.display());
                    FileOutcome::Skipped(task_path)
                }
                Err(error) => {
                    tracing::warn!("{}", error);
                    FileOutcome::Failed(error)
                }
            };

            let _ = done_tx.send(());
            outcome
        });

        lock(&self.tasks).push((path, handle));
    }

    /// Number of dispatched writes not yet joined
    pub fn pending(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Wait for every dispatched write, including ones dispatched while waiting
    ///
    /// Concurrent waiters are serialised: none returns while a write is in
    /// flight. Each write's outcome lands in the report of the waiter that
    /// joined it.
    pub async fn wait(&self) -> BatchReport {
        let _guard = self.waiters.lock().await;
        let mut report = BatchReport::default();

        loop {
            let tasks = std::mem::take(&mut *lock(&self.tasks));
            if tasks.is_empty() {
                break;
            }

            for (path, handle) in tasks {
                match handle.await {
                    Ok(outcome) => report.record(outcome),
                    Err(e) => report.failures.push(ModuleError::Write {
                        path: path.clone(),
                        source: std::io::Error::other(e.to_string()),
                    }),
                }
                self.forget_finished(&path);
            }
        }

        report
    }
}

impl Templator {
    /// Drop the ordering entry of `path` unless a later write is still pending
    fn forget_finished(&self, path: &Path) {
        let mut last_write = lock(&self.last_write);
        let finished = last_write
            .get_mut(path)
            .is_some_and(|done| !matches!(done.try_recv(), Err(TryRecvError::Empty)));
        if finished {
            last_write.remove(path);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Render and write one file
///
/// Returns `Ok(false)` when a preserved file already exists. Rendering happens
/// before the file is opened so a failed render leaves nothing behind.
async fn write_templated_file(
    path: &Path,
    template: &TemplateRef,
    data: &Context,
    mode: WriteMode,
) -> Result<bool, ModuleError> {
    if mode == WriteMode::Preserve && fs::try_exists(path).await.unwrap_or(false) {
        return Ok(false);
    }

    let source = match template {
        TemplateRef::Inline(source) => source.clone(),
        TemplateRef::File(template_path) => fs::read_to_string(template_path)
            .await
            .map_err(|e| ModuleError::Render {
                path: path.to_path_buf(),
                message: format!("failed to read template {}: {}", template_path.display(), e),
            })?,
    };

    let rendered = renderer::render(&source, data).map_err(|e| ModuleError::Render {
        path: path.to_path_buf(),
        message: renderer::describe_error(&e),
    })?;

    let write_error = |source: std::io::Error| ModuleError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let mut file = match mode {
        WriteMode::Overwrite => fs::File::create(path).await.map_err(write_error)?,
        WriteMode::Preserve => {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
                Err(e) => return Err(write_error(e)),
            }
        }
    };

    file.write_all(rendered.as_bytes())
        .await
        .map_err(write_error)?;
    file.flush().await.map_err(write_error)?;

    Ok(true)
}
