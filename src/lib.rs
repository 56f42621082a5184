//! wasmcc: compile untrusted C/C++ to WebAssembly over HTTP.
//!
//! The service writes client sources into a throwaway scratch directory,
//! drives an external wasm-targeting clang toolchain over them one stage at a
//! time, and returns the linked module as base64 together with the console
//! output of every stage. A websocket endpoint bridges editors to a
//! per-connection `clangd`.

pub mod build;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod language_server;
pub mod safety;

pub use config::Config;
