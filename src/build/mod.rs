//! Sandboxed C/C++ to WebAssembly build pipeline.
//!
//! A request flows through these pieces in order:
//! - **Workspace**: a throwaway scratch directory keyed by a random token
//! - **ProcessRunner**: runs `clang`/`clang++` once per source file, then once to link
//! - **artifact**: base64 (optionally deflated) encoding of the linked module
//!
//! [`BuildOrchestrator`] drives them and guarantees cleanup on every path.

pub mod artifact;
pub mod orchestrator;
pub mod runner;
pub mod types;
pub mod workspace;

pub use orchestrator::BuildOrchestrator;
pub use runner::{ProcessRunner, ToolCommand};
pub use types::{BuildRequest, BuildResult, FileSpec, OutputKind, SourceLanguage, Task};
pub use workspace::Workspace;
