//! The build pipeline.
//!
//! ```text
//! Init ─▶ WriteInputs ─▶ Compile[0..n) ─▶ Link ─▶ Serialize ─▶ Cleanup(success)
//!              │               │            │          │
//!              └───────────────┴────────────┴──────────┴────▶ Cleanup(failure)
//! ```
//!
//! Stages run strictly in order and the first failure ends the build: later
//! files are not compiled and no further tasks are recorded. Every exit goes
//! through [`Workspace::complete`], and internal errors fall back on the
//! workspace's drop guard, so nothing a request writes outlives it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::BuildError;
use crate::safety::{compile_args, link_args, validate_filename};

use super::artifact;
use super::runner::{ProcessRunner, ToolCommand};
use super::types::{BuildRequest, BuildResult, SourceLanguage, Task};
use super::workspace::Workspace;

/// Runs build requests against the configured toolchain.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    config: Arc<Config>,
    runner: ProcessRunner,
}

impl BuildOrchestrator {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            runner: ProcessRunner::new(),
        }
    }

    /// Build `request` in a fresh randomly named workspace.
    ///
    /// Blocks for the whole pipeline. Stage failures come back as
    /// `Ok(BuildResult { success: false, .. })`; `Err` is reserved for
    /// failures of the host itself.
    pub fn build(&self, request: &BuildRequest) -> Result<BuildResult, BuildError> {
        let workspace = Workspace::begin_in(&self.config.scratch_dir)?;
        self.build_in(workspace, request)
    }

    /// Run the build on the blocking thread pool.
    pub async fn build_blocking(
        self: Arc<Self>,
        request: BuildRequest,
    ) -> Result<BuildResult, BuildError> {
        tokio::task::spawn_blocking(move || self.build(&request))
            .await
            .map_err(|e| BuildError::WorkerPanicked(e.to_string()))?
    }

    /// Build `request` inside an already created workspace.
    ///
    /// Returns `Err` only for host failures (I/O on the scratch directory);
    /// the workspace is still removed in that case.
    pub fn build_in(
        &self,
        workspace: Workspace,
        request: &BuildRequest,
    ) -> Result<BuildResult, BuildError> {
        let span = tracing::info_span!("build", base = %workspace.base().display());
        let _guard = span.enter();
        tracing::info!(files = request.files.len(), "Building");

        let mut result = BuildResult::default();

        // The whole layout is checked before anything is written.
        if let Err(e) = request.validate() {
            if !e.is_validation() {
                return Err(e);
            }
            tracing::warn!("{}", e);
            return Ok(workspace.complete(result, false, e.to_string()));
        }
        let sources = request
            .files
            .iter()
            .map(|file| Ok(workspace.source_path(&validate_filename(&file.name)?)))
            .collect::<Result<Vec<_>, BuildError>>()?;

        for (file, path) in request.files.iter().zip(&sources) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &file.src)?;
        }

        let mut objects = Vec::new();
        let mut has_cpp = false;
        for (file, source) in request.files.iter().zip(&sources) {
            let Some(language) = file.language() else {
                tracing::debug!(file = %file.name, kind = %file.kind, "Not compiling");
                continue;
            };
            has_cpp |= language == SourceLanguage::Cpp;

            let object = object_path(source);
            remove_stale(&object)?;

            let command = ToolCommand::new(self.compiler(language))
                .args(compile_args(file.options(), &self.config.toolchain))
                .arg(source)
                .arg("-o")
                .arg(&object);
            let console = self
                .runner
                .run(&command, workspace.scratch_dir(), workspace.console_log());

            let success = object.exists();
            let mut task = Task::compile(&file.name);
            task.finish(success, console);
            result.tasks.push(task);

            if !success {
                tracing::info!(file = %file.name, "Compile failed");
                return Ok(workspace.complete(
                    result,
                    false,
                    format!("Error during build of {}", file.name),
                ));
            }
            objects.push(object);
        }

        let linker = if has_cpp {
            self.config.toolchain.clang_cpp()
        } else {
            self.config.toolchain.clang()
        };
        let command = ToolCommand::new(linker)
            .args(link_args(request.link_options(), &self.config.toolchain))
            .args(&objects)
            .arg("-o")
            .arg(workspace.artifact_path());
        let console = self
            .runner
            .run(&command, workspace.scratch_dir(), workspace.console_log());

        let success = workspace.artifact_path().exists();
        let mut task = Task::link();
        task.finish(success, console);
        result.tasks.push(task);

        if !success {
            tracing::info!("Link failed");
            return Ok(workspace.complete(result, false, "Error during linking"));
        }

        result.output = artifact::serialize_file(workspace.artifact_path(), request.compress())?;
        tracing::info!(bytes = result.output.len(), "Build succeeded");
        Ok(workspace.complete(result, true, "Success"))
    }

    fn compiler(&self, language: SourceLanguage) -> PathBuf {
        match language {
            SourceLanguage::C => self.config.toolchain.clang(),
            SourceLanguage::Cpp => self.config.toolchain.clang_cpp(),
        }
    }
}

/// `<source>.o`, next to the source.
fn object_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".o");
    PathBuf::from(name)
}

/// A client file may already sit where an object is expected; it must not
/// be mistaken for compiler output. Directories there are rejected by
/// [`BuildRequest::validate`].
fn remove_stale(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
