//! Synchronous toolchain invocation with captured console output.
//!
//! Commands are executed directly, never through a shell. Standard output and
//! standard error share one sink file so diagnostics keep their interleaving.
//! A failing command is not an error here: callers judge success by looking
//! for the output file the command was supposed to produce, since toolchains
//! do not agree on exit codes.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A program and its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs toolchain commands and returns whatever they printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command` in `cwd`, blocking until it exits.
    ///
    /// Returns the contents of `sink`, or the failure description when the
    /// command failed without printing anything.
    pub fn run(&self, command: &ToolCommand, cwd: &Path, sink: &Path) -> String {
        let failure = match open_sink(sink) {
            Ok((stdout, stderr)) => {
                tracing::debug!(cwd = %cwd.display(), "Running {}", command);
                match Command::new(command.program())
                    .args(command.get_args())
                    .current_dir(cwd)
                    .stdin(Stdio::null())
                    .stdout(stdout)
                    .stderr(stderr)
                    .status()
                {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(format!("Command failed: {}\n{}", command, status)),
                    Err(e) => Some(format!("Command failed: {}\n{}", command, e)),
                }
            }
            Err(e) => Some(format!("Failed to open console sink: {}", e)),
        };

        let captured = fs::read(sink)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();

        if captured.is_empty() {
            if let Some(ref reason) = failure {
                tracing::debug!("{}", reason);
            }
            failure.unwrap_or_default()
        } else {
            captured
        }
    }
}

fn open_sink(sink: &Path) -> std::io::Result<(Stdio, Stdio)> {
    let file = File::create(sink)?;
    let err = file.try_clone()?;
    Ok((Stdio::from(file), Stdio::from(err)))
}

#[cfg(all(test, unix))]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_display_joins_args() {
        let cmd = ToolCommand::new("/opt/bin/clang")
            .args(["-c", "main.c"])
            .arg("-o")
            .arg("main.c.o");
        assert_eq!(cmd.to_string(), "/opt/bin/clang -c main.c -o main.c.o");
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        let out = ProcessRunner::new().run(&sh("echo to-out; echo to-err 1>&2"), dir.path(), &sink);
        assert!(out.contains("to-out"));
        assert!(out.contains("to-err"));
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        ProcessRunner::new().run(&sh("touch marker"), dir.path(), &sink);
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_failure_with_output_returns_output() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        let out = ProcessRunner::new().run(&sh("echo 'main.c:1:1: error'; exit 1"), dir.path(), &sink);
        assert_eq!(out.trim(), "main.c:1:1: error");
    }

    #[test]
    fn test_silent_failure_returns_reason() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        let out = ProcessRunner::new().run(&sh("exit 3"), dir.path(), &sink);
        assert!(out.starts_with("Command failed: sh -c exit 3"), "got {}", out);
    }

    #[test]
    fn test_spawn_failure_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        let cmd = ToolCommand::new(dir.path().join("no-such-compiler"));
        let out = ProcessRunner::new().run(&cmd, dir.path(), &sink);
        assert!(out.contains("Command failed"));
        assert!(out.contains("no-such-compiler"));
    }

    #[test]
    fn test_silent_success_is_empty() {
        let dir = TempDir::new().unwrap();
        let sink = dir.path().join("out.log");
        assert_eq!(ProcessRunner::new().run(&sh("true"), dir.path(), &sink), "");
    }
}
