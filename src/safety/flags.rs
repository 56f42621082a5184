//! Compiler and linker flag allow-lists.
//!
//! Client option strings are never passed through. Each stage has a fixed
//! list of recognised flags; the option string is only searched for those
//! flags, and whatever else it contains is dropped without a trace.

use crate::config::ToolchainConfig;

const WASM_TARGET: &str = "--target=wasm32-unknown-unknown-wasm";

/// Flags a client may enable for the compile stage, in emission order.
pub const COMPILE_ALLOWLIST: &[&str] = &[
    "-O0",
    "-O1",
    "-O2",
    "-O3",
    "-O4",
    "-Os",
    "-fno-exceptions",
    "-fno-rtti",
    "-ffast-math",
    "-fno-inline",
    "-std=c99",
    "-std=c89",
    "-std=c++14",
    "-std=c++1z",
    "-std=c++11",
    "-std=c++98",
    "-g",
];

/// Flags a client may pass to the linker, in emission order.
pub const LINK_ALLOWLIST: &[&str] = &["--import-memory", "-g"];

/// Build the compile-stage argument list for a client option string.
///
/// The mandatory prefix always comes first, followed by allow-listed flags
/// found in `options`, in allow-list order.
pub fn compile_args(options: &str, toolchain: &ToolchainConfig) -> Vec<String> {
    let mut args = vec![
        WASM_TARGET.to_string(),
        format!("--sysroot={}", toolchain.sysroot().display()),
        format!("-I{}", toolchain.include_dir.display()),
        "-fdiagnostics-print-source-range-info".to_string(),
        "-fno-exceptions".to_string(),
        "-c".to_string(),
    ];
    args.extend(allowed_flags(options, COMPILE_ALLOWLIST).map(str::to_string));
    args
}

/// Build the link-stage argument list for a client option string.
///
/// Allowed linker flags are forwarded through the driver as `-Wl,<flag>`.
pub fn link_args(options: &str, toolchain: &ToolchainConfig) -> Vec<String> {
    let mut args = vec![
        WASM_TARGET.to_string(),
        format!("--sysroot={}", toolchain.sysroot().display()),
        "-nostartfiles".to_string(),
        "-Wl,--allow-undefined,--no-entry,--no-threads".to_string(),
    ];
    args.extend(allowed_flags(options, LINK_ALLOWLIST).map(|flag| format!("-Wl,{}", flag)));
    args
}

/// Allow-listed flags contained in `options`.
///
/// This is a substring test, not a tokenizer. Language-standard selectors
/// match case-insensitively, everything else is case-sensitive.
fn allowed_flags<'a>(options: &str, allowlist: &'a [&'a str]) -> impl Iterator<Item = &'a str> {
    let lowered = options.to_lowercase();
    allowlist.iter().copied().filter(move |flag| {
        options.contains(flag) || (flag.starts_with("-std=") && lowered.contains(flag))
    })
}
