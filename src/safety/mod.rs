//! Input safety for the build pipeline.
//!
//! Everything a client sends that ends up on the local filesystem or on a
//! toolchain command line passes through this module first:
//! - Filenames are checked against a strict relative-path grammar
//! - Compile and link option strings are reduced to allow-listed flags

pub mod filename;
pub mod flags;

pub use filename::validate_filename;
pub use flags::{COMPILE_ALLOWLIST, LINK_ALLOWLIST, compile_args, link_args};
