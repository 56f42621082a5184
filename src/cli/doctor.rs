//! Doctor diagnostics CLI command.
//!
//! Verifies that the toolchain, sysroot and analysis server the service
//! depends on are actually present, and reports actionable fixes.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// Diagnostic check result.
struct Check {
    name: &'static str,
    status: CheckStatus,
    message: String,
    fix: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl Check {
    fn ok(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Ok,
            message: message.into(),
            fix: None,
        }
    }

    fn warn(name: &'static str, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warning,
            message: message.into(),
            fix: Some(fix.into()),
        }
    }

    fn error(name: &'static str, message: impl Into<String>, fix: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Error,
            message: message.into(),
            fix: Some(fix.into()),
        }
    }

    fn icon(&self) -> &'static str {
        match self.status {
            CheckStatus::Ok => "[OK]",
            CheckStatus::Warning => "[WARN]",
            CheckStatus::Error => "[ERR]",
        }
    }
}

/// Run all diagnostics against the resolved configuration.
pub async fn run_doctor_command(config: &Config) -> anyhow::Result<()> {
    println!("wasmcc doctor");
    println!("=============\n");

    let checks = vec![
        check_binary("clang", &config.toolchain.clang()),
        check_binary("clang++", &config.toolchain.clang_cpp()),
        check_directory(
            "Sysroot",
            &config.toolchain.sysroot(),
            "Set WASMCEPTION to a toolchain containing sysroot/",
        ),
        check_include_dir(&config.toolchain.include_dir),
        check_scratch_dir(&config.scratch_dir),
        check_language_server(&config.language_server.command),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for check in &checks {
        println!("  {} {}: {}", check.icon(), check.name, check.message);
        if let Some(ref fix) = check.fix {
            println!("       Fix: {}", fix);
        }
        match check.status {
            CheckStatus::Error => errors += 1,
            CheckStatus::Warning => warnings += 1,
            CheckStatus::Ok => {}
        }
    }

    println!();
    println!(
        "Summary: {} checks, {} passed, {} warnings, {} errors",
        checks.len(),
        checks.len() - errors - warnings,
        warnings,
        errors
    );

    if errors > 0 {
        anyhow::bail!("{} check(s) failed", errors);
    }
    Ok(())
}

fn check_binary(name: &'static str, path: &Path) -> Check {
    if path.is_file() {
        Check::ok(name, path.display().to_string())
    } else {
        Check::error(
            name,
            format!("{} (missing)", path.display()),
            "Set WASMCEPTION or --toolchain-dir to the wasmception install root",
        )
    }
}

fn check_directory(name: &'static str, path: &Path, fix: &str) -> Check {
    if path.is_dir() {
        Check::ok(name, path.display().to_string())
    } else {
        Check::error(name, format!("{} (missing)", path.display()), fix)
    }
}

fn check_include_dir(path: &Path) -> Check {
    if path.is_dir() {
        Check::ok("Includes", path.display().to_string())
    } else {
        Check::warn(
            "Includes",
            format!("{} (missing)", path.display()),
            "Set WASMCC_INCLUDE_DIR if your sources rely on extra headers",
        )
    }
}

fn check_scratch_dir(path: &Path) -> Check {
    if !path.is_dir() {
        return check_directory("Scratch Dir", path, "Create it or set WASMCC_SCRATCH_DIR");
    }
    let probe = path.join(format!(".wasmcc-doctor-{}", std::process::id()));
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            Check::ok("Scratch Dir", format!("{} (writable)", path.display()))
        }
        Err(e) => Check::error(
            "Scratch Dir",
            format!("{} is not writable: {}", path.display(), e),
            "Fix permissions or set WASMCC_SCRATCH_DIR",
        ),
    }
}

fn check_language_server(command: &str) -> Check {
    match find_executable(command) {
        Some(path) => Check::ok("Language Server", path.display().to_string()),
        None => Check::warn(
            "Language Server",
            format!("'{}' not found", command),
            "Install clangd or set WASMCC_LANGUAGE_SERVER",
        ),
    }
}

/// Resolve `command` the way a spawn would: as a path if it has a
/// separator, otherwise through `PATH`.
fn find_executable(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_binary_is_error() {
        let check = check_binary("clang", Path::new("/nonexistent/bin/clang"));
        assert_eq!(check.status, CheckStatus::Error);
        assert!(check.fix.is_some());
    }

    #[test]
    fn test_present_binary_is_ok() {
        let dir = TempDir::new().unwrap();
        let clang = dir.path().join("clang");
        std::fs::write(&clang, "").unwrap();
        assert_eq!(check_binary("clang", &clang).status, CheckStatus::Ok);
    }

    #[test]
    fn test_scratch_dir_writable() {
        let dir = TempDir::new().unwrap();
        let check = check_scratch_dir(dir.path());
        assert_eq!(check.status, CheckStatus::Ok);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_include_dir_is_only_a_warning() {
        let check = check_include_dir(Path::new("/nonexistent/includes"));
        assert_eq!(check.status, CheckStatus::Warning);
    }

    #[test]
    fn test_find_executable_by_path() {
        let dir = TempDir::new().unwrap();
        let server = dir.path().join("clangd");
        std::fs::write(&server, "").unwrap();
        assert_eq!(find_executable(server.to_str().unwrap()), Some(server));
        assert!(find_executable("/nonexistent/clangd").is_none());
    }
}
