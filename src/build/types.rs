//! Request and response types for the build API.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::safety::validate_filename;

/// Artifact kinds a build can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Wasm,
}

/// A build request as posted to `/api/build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRequest {
    pub output: OutputKind,
    /// Source files in compile and link order.
    pub files: Vec<FileSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
}

/// One client-supplied file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    /// Source language tag. Only `c` and `cpp` are compiled.
    #[serde(rename = "type")]
    pub kind: String,
    /// Relative path inside the scratch directory.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub src: String,
}

/// Languages the toolchain is invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    C,
    Cpp,
}

impl SourceLanguage {
    /// Map a `FileSpec` type tag to a language. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "c" => Some(Self::C),
            "cpp" => Some(Self::Cpp),
            _ => None,
        }
    }
}

impl BuildRequest {
    /// Check every filename, then check that the files can all be laid out
    /// in one directory tree.
    ///
    /// A name may not be both a file and a parent directory of another name,
    /// and the object a compiled file produces (`<name>.o`) may not be a
    /// directory either.
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut dirs = HashSet::new();
        for file in &self.files {
            let segments = validate_filename(&file.name)?;
            for depth in 1..segments.len() {
                dirs.insert(segments[..depth].join("/"));
            }
        }

        for file in &self.files {
            if dirs.contains(&file.name) {
                return Err(BuildError::PathConflict(file.name.clone()));
            }
            if file.language().is_some() {
                let object = format!("{}.o", file.name);
                if dirs.contains(&object) {
                    return Err(BuildError::PathConflict(object));
                }
            }
        }
        Ok(())
    }

    pub fn compress(&self) -> bool {
        self.compress.unwrap_or(false)
    }

    pub fn link_options(&self) -> &str {
        self.link_options.as_deref().unwrap_or("")
    }
}

impl FileSpec {
    pub fn language(&self) -> Option<SourceLanguage> {
        SourceLanguage::from_tag(&self.kind)
    }

    pub fn options(&self) -> &str {
        self.options.as_deref().unwrap_or("")
    }
}

/// Log entry for one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Task {
    pub fn compile(file: &str) -> Self {
        Self {
            name: format!("building {}", file),
            file: Some(file.to_string()),
            ..Self::default()
        }
    }

    pub fn link() -> Self {
        Self {
            name: "linking wasm".to_string(),
            ..Self::default()
        }
    }

    /// Record the stage outcome and its captured console output.
    pub fn finish(&mut self, success: bool, console: String) {
        self.console = Some(console);
        self.success = Some(success);
    }
}

/// Response body of `/api/build`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub success: bool,
    pub message: String,
    /// Base64 artifact (deflated when requested); empty on failure.
    pub output: String,
    pub tasks: Vec<Task>,
}
