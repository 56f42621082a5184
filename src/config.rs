//! Service configuration.
//!
//! Resolved once at startup from environment variables (optionally seeded
//! from a `.env` file) and CLI overrides, then shared read-only behind an
//! `Arc` by every component that needs toolchain paths.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_HOST: &str = "::";
const DEFAULT_INCLUDE_DIR: &str = "/app/clang/includes";
const DEFAULT_SCRATCH_DIR: &str = "/tmp";
const DEFAULT_LANGUAGE_SERVER: &str = "clangd";

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub toolchain: ToolchainConfig,
    /// Directory under which per-build scratch directories are created.
    pub scratch_dir: PathBuf,
    pub language_server: LanguageServerConfig,
}

/// Listening socket settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Location of the wasm-targeting clang toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Toolchain install root (contains `dist/` and `sysroot/`).
    pub root: PathBuf,
    /// Extra header directory passed with `-I` to every compile.
    pub include_dir: PathBuf,
}

/// Command used to start the external analysis server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageServerConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "PORT".to_string(),
                    message: format!("'{}' is not a valid port: {}", raw, e),
                })?,
            None => DEFAULT_PORT,
        };

        let host = lookup("HOST")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let root = match lookup("WASMCEPTION").filter(|v| !v.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_toolchain_root(&std::env::current_dir()?),
        };

        let include_dir = lookup("WASMCC_INCLUDE_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INCLUDE_DIR));

        let scratch_dir = lookup("WASMCC_SCRATCH_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR));

        let language_server = match lookup("WASMCC_LANGUAGE_SERVER").filter(|v| !v.trim().is_empty())
        {
            Some(raw) => LanguageServerConfig::parse(&raw)?,
            None => LanguageServerConfig::default(),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            toolchain: ToolchainConfig { root, include_dir },
            scratch_dir,
            language_server,
        })
    }
}

impl ServerConfig {
    /// Resolve the configured host and port into a bindable address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ConfigError::InvalidValue {
                key: "HOST".to_string(),
                message: format!("cannot resolve '{}': {}", self.host, e),
            })?
            .next()
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "HOST".to_string(),
                message: format!("'{}' resolved to no addresses", self.host),
            })
    }
}

impl ToolchainConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_dir: PathBuf::from(DEFAULT_INCLUDE_DIR),
        }
    }

    /// Directory holding the LLVM distribution (`bin/clang`, ...).
    pub fn llvm_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    pub fn sysroot(&self) -> PathBuf {
        self.root.join("sysroot")
    }

    pub fn clang(&self) -> PathBuf {
        self.llvm_dir().join("bin").join("clang")
    }

    pub fn clang_cpp(&self) -> PathBuf {
        self.llvm_dir().join("bin").join("clang++")
    }
}

impl LanguageServerConfig {
    /// Parse a whitespace separated command line such as `clangd --log=error`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let command = parts.next().ok_or_else(|| ConfigError::InvalidValue {
            key: "WASMCC_LANGUAGE_SERVER".to_string(),
            message: "empty command".to_string(),
        })?;
        Ok(Self {
            command,
            args: parts.collect(),
        })
    }
}

impl Default for LanguageServerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_LANGUAGE_SERVER.to_string(),
            args: Vec::new(),
        }
    }
}

/// `<cwd>/clang/wasmception-<platform>-bin`, using the platform names the
/// prebuilt toolchain archives are published under.
fn default_toolchain_root(cwd: &Path) -> PathBuf {
    let platform = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };
    cwd.join("clang")
        .join(format!("wasmception-{}-bin", platform))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "::");
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp"));
        assert_eq!(config.toolchain.include_dir, PathBuf::from("/app/clang/includes"));
        assert_eq!(config.language_server.command, "clangd");
        assert!(config.language_server.args.is_empty());
        let root = config.toolchain.root.to_string_lossy().to_string();
        assert!(root.contains("wasmception-"), "unexpected root {}", root);
        assert!(root.ends_with("-bin"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("WASMCEPTION", "/opt/wasmception"),
            ("WASMCC_SCRATCH_DIR", "/var/tmp/builds"),
            ("WASMCC_LANGUAGE_SERVER", "clangd --log=error"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/builds"));
        assert_eq!(config.language_server.command, "clangd");
        assert_eq!(config.language_server.args, vec!["--log=error".to_string()]);
        assert_eq!(
            config.toolchain.clang(),
            PathBuf::from("/opt/wasmception/dist/bin/clang")
        );
        assert_eq!(
            config.toolchain.clang_cpp(),
            PathBuf::from("/opt/wasmception/dist/bin/clang++")
        );
        assert_eq!(
            config.toolchain.sysroot(),
            PathBuf::from("/opt/wasmception/sysroot")
        );
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "ninety")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "PORT"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_bind_addr_ipv6_any() {
        let server = ServerConfig {
            host: "::".to_string(),
            port: 9000,
        };
        let addr = server.bind_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn test_bind_addr_ipv4() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        assert_eq!(server.bind_addr().unwrap().to_string(), "127.0.0.1:0");
    }

    #[test]
    fn test_language_server_parse_empty() {
        assert!(LanguageServerConfig::parse("   ").is_err());
    }

    #[test]
    fn test_default_root_uses_platform_name() {
        let root = default_toolchain_root(Path::new("/srv"));
        assert!(root.starts_with("/srv/clang"));
        assert!(!root.to_string_lossy().contains("macos"));
    }
}
