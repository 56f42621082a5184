//! Per-build scratch workspace.
//!
//! A workspace owns three paths derived from one base name:
//! - `<base>.$`: scratch directory holding sources and object files
//! - `<base>.wasm`: the linked artifact
//! - `<base>.log`: the console sink toolchain output is captured into
//!
//! All three are removed by [`Workspace::complete`]. A workspace dropped
//! without being completed (an internal error or a panic mid-build) removes
//! them as well, so no request leaves residue on disk.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distributions::Alphanumeric;

use super::types::BuildResult;

const TOKEN_LEN: usize = 16;

/// Scratch state exclusively owned by a single build.
#[derive(Debug)]
pub struct Workspace {
    base: PathBuf,
    scratch_dir: PathBuf,
    artifact_path: PathBuf,
    console_log: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create the scratch directory for `base` if it does not exist yet.
    ///
    /// Paths are made absolute because toolchain commands run with the
    /// scratch directory as their working directory.
    pub fn begin(base: impl Into<PathBuf>) -> io::Result<Self> {
        let base = std::path::absolute(base.into())?;
        let workspace = Self {
            scratch_dir: with_suffix(&base, ".$"),
            artifact_path: with_suffix(&base, ".wasm"),
            console_log: with_suffix(&base, ".log"),
            base,
            released: false,
        };
        fs::create_dir_all(&workspace.scratch_dir)?;
        Ok(workspace)
    }

    /// Begin a workspace named `build_<random token>` under `root`.
    pub fn begin_in(root: &Path) -> io::Result<Self> {
        Self::begin(root.join(format!("build_{}", random_token())))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn console_log(&self) -> &Path {
        &self.console_log
    }

    /// Path of a validated source file inside the scratch directory.
    pub fn source_path(&self, segments: &[&str]) -> PathBuf {
        segments
            .iter()
            .fold(self.scratch_dir.clone(), |path, segment| path.join(segment))
    }

    /// Remove everything the build produced and stamp the final outcome.
    pub fn complete(
        mut self,
        mut result: BuildResult,
        success: bool,
        message: impl Into<String>,
    ) -> BuildResult {
        self.release();
        result.success = success;
        result.message = message.into();
        result
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Err(e) = fs::remove_dir_all(&self.scratch_dir)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %self.scratch_dir.display(),
                "Failed to remove scratch directory: {}",
                e
            );
        }
        for path in [&self.artifact_path, &self.console_log] {
            if let Err(e) = fs::remove_file(path)
                && e.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), "Failed to remove build file: {}", e);
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.released {
            tracing::debug!(base = %self.base.display(), "Releasing abandoned workspace");
            self.release();
        }
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Lowercase alphanumeric token, safe on case-insensitive filesystems.
fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
