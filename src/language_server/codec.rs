//! `Content-Length` framing for JSON-RPC over stdio.
//!
//! The analysis server speaks `Content-Length: N\r\n\r\n{json}` on its stdin
//! and stdout, while the websocket side carries one bare JSON message per
//! text frame. These types translate between the two.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::LanguageServerError;

/// Upper bound on a single frame read from the server.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Reads framed JSON-RPC messages.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next message. `Ok(None)` means clean EOF between frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, LanguageServerError> {
        let Some(content_length) = self.read_headers().await? else {
            return Ok(None);
        };

        if content_length > MAX_FRAME_BYTES {
            return Err(LanguageServerError::FrameTooLarge {
                size: content_length,
                max: MAX_FRAME_BYTES,
            });
        }

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn read_headers(&mut self) -> Result<Option<usize>, LanguageServerError> {
        let mut content_length = None;
        let mut line = String::new();
        let mut saw_header = false;

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                if saw_header {
                    return Err(LanguageServerError::UnexpectedEof);
                }
                return Ok(None);
            }
            saw_header = true;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            // Other headers (Content-Type) are ignored.
            if let Some((key, value)) = trimmed.split_once(':')
                && key.trim().eq_ignore_ascii_case("Content-Length")
            {
                let len = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| LanguageServerError::InvalidHeader(trimmed.to_string()))?;
                content_length = Some(len);
            }
        }

        content_length
            .map(Some)
            .ok_or(LanguageServerError::MissingContentLength)
    }
}

/// Writes framed JSON-RPC messages.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, msg: &serde_json::Value) -> Result<(), LanguageServerError> {
        let body = serde_json::to_vec(msg)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
