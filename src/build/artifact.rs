//! Artifact encoding for the JSON response.
//!
//! Artifacts travel as standard base64, optionally zlib-deflated first.
//! There is no decode path here; clients inflate compressed output themselves.

use std::io::{self, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Read `path` and encode it for transport.
pub fn serialize_file(path: &Path, compress: bool) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    encode(&bytes, compress)
}

/// Encode raw artifact bytes, deflating them first when `compress` is set.
pub fn encode(bytes: &[u8], compress: bool) -> io::Result<String> {
    if compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes)?;
        let deflated = encoder.finish()?;
        Ok(STANDARD.encode(deflated))
    } else {
        Ok(STANDARD.encode(bytes))
    }
}
