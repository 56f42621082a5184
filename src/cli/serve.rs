//! `serve` command: run the HTTP and websocket server until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::channels;
use crate::config::Config;

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Toolchain install root (overrides WASMCEPTION)
    #[arg(long)]
    pub toolchain_dir: Option<PathBuf>,

    /// Directory for per-build scratch space (overrides WASMCC_SCRATCH_DIR)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Layer command-line overrides on top of the environment configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(ref dir) = self.toolchain_dir {
            config.toolchain.root = dir.clone();
        }
        if let Some(ref dir) = self.scratch_dir {
            config.scratch_dir = dir.clone();
        }
    }
}

/// Start the server and block until Ctrl-C.
pub async fn run_serve_command(config: Config) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    let server = channels::start(addr, Arc::new(config)).await?;

    tokio::signal::ctrl_c().await?;
    server.shutdown().await?;
    Ok(())
}
