//! CLI command handling.
//!
//! Provides subcommands for:
//! - Running the build server (`serve`, the default)
//! - Checking the toolchain installation (`doctor`)

mod doctor;
mod serve;

pub use doctor::run_doctor_command;
pub use serve::{ServeArgs, run_serve_command};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wasmcc")]
#[command(about = "Compile C/C++ to WebAssembly over HTTP, with a clangd websocket bridge")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the build server (default if no subcommand given)
    Serve(ServeArgs),

    /// Check toolchain, sysroot and language server availability
    Doctor(ServeArgs),
}

impl Cli {
    pub fn serve_args(&self) -> ServeArgs {
        match &self.command {
            Some(Command::Serve(args)) | Some(Command::Doctor(args)) => args.clone(),
            None => ServeArgs::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["wasmcc"]);
        assert!(cli.command.is_none());
        assert!(cli.serve_args().port.is_none());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from(["wasmcc", "serve", "--port", "8080", "--json-logs"]);
        assert!(cli.json_logs);
        assert_eq!(cli.serve_args().port, Some(8080));
    }

    #[test]
    fn test_doctor_accepts_toolchain_dir() {
        let cli = Cli::parse_from(["wasmcc", "doctor", "--toolchain-dir", "/opt/wasm"]);
        assert!(matches!(cli.command, Some(Command::Doctor(_))));
        assert_eq!(
            cli.serve_args().toolchain_dir,
            Some(std::path::PathBuf::from("/opt/wasm"))
        );
    }
}
