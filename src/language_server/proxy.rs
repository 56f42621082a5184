//! Websocket to analysis-server relay.
//!
//! Each websocket connection owns exactly one spawned server process. The
//! session is a small state machine driven by three socket events:
//!
//! | Event     | Relaying                         | Disposed |
//! |-----------|----------------------------------|----------|
//! | `Message` | forward to server stdin          | ignored  |
//! | `Error`   | kill server, become `Disposed`   | ignored  |
//! | `Close`   | kill server, become `Disposed`   | ignored  |
//!
//! Messages from the server flow back through the receiver returned by
//! [`LanguageServerSession::spawn`]; it yields `None` once the server's stdout
//! closes, at which point the relay closes the socket.

use std::process::{ExitStatus, Stdio};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::codec::{FrameReader, FrameWriter};
use crate::config::LanguageServerConfig;
use crate::error::LanguageServerError;

const CHANNEL_CAPACITY: usize = 64;

/// Transitions driving a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Message(String),
    Error(String),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Relaying,
    Disposed,
}

/// One client connection paired with one analysis-server process.
pub struct LanguageServerSession {
    child: Child,
    to_server: Option<mpsc::Sender<serde_json::Value>>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    state: SessionState,
    exit_status: Option<ExitStatus>,
}

impl LanguageServerSession {
    /// Spawn the configured server and start the stdio pumps.
    pub fn spawn(
        config: &LanguageServerConfig,
    ) -> Result<(Self, mpsc::Receiver<serde_json::Value>), LanguageServerError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LanguageServerError::Spawn {
                command: config.command.clone(),
                reason: e.to_string(),
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(LanguageServerError::StdioUnavailable("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(LanguageServerError::StdioUnavailable("stdout"))?;

        let (to_server, mut server_rx) = mpsc::channel::<serde_json::Value>(CHANNEL_CAPACITY);
        let writer_handle = tokio::spawn(async move {
            let mut writer = FrameWriter::new(stdin);
            while let Some(msg) = server_rx.recv().await {
                if let Err(e) = writer.write_frame(&msg).await {
                    tracing::warn!("Language server write error: {}", e);
                    break;
                }
            }
        });

        let (client_tx, from_server) = mpsc::channel::<serde_json::Value>(CHANNEL_CAPACITY);
        let reader_handle = tokio::spawn(async move {
            let mut reader = FrameReader::new(stdout);
            loop {
                match reader.read_frame().await {
                    Ok(Some(msg)) => {
                        if client_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Language server closed stdout");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Language server read error: {}", e);
                        break;
                    }
                }
            }
        });

        tracing::debug!(pid = ?child.id(), command = %config.command, "Spawned language server");

        Ok((
            Self {
                child,
                to_server: Some(to_server),
                reader_handle,
                writer_handle,
                state: SessionState::Relaying,
                exit_status: None,
            },
            from_server,
        ))
    }

    /// Apply one socket event.
    pub async fn handle(&mut self, event: SocketEvent) -> SessionState {
        if self.state == SessionState::Disposed {
            return self.state;
        }

        match event {
            SocketEvent::Message(text) => {
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(msg) => {
                        if let Some(tx) = &self.to_server
                            && tx.send(msg).await.is_err()
                        {
                            tracing::warn!("Language server no longer accepting input");
                        }
                    }
                    Err(e) => tracing::warn!("Dropping malformed client message: {}", e),
                }
            }
            SocketEvent::Error(reason) => {
                tracing::warn!("Client socket error: {}", reason);
                self.dispose().await;
            }
            SocketEvent::Close => {
                tracing::info!("Client closed");
                self.dispose().await;
            }
        }
        self.state
    }

    /// Terminate the server and wait for it to exit.
    pub async fn dispose(&mut self) -> Option<ExitStatus> {
        if self.state == SessionState::Disposed {
            return self.exit_status;
        }
        self.state = SessionState::Disposed;
        self.to_server = None;

        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Language server already gone: {}", e);
        }
        match self.child.wait().await {
            Ok(status) => self.exit_status = Some(status),
            Err(e) => tracing::warn!("Failed to reap language server: {}", e),
        }
        self.reader_handle.abort();
        self.writer_handle.abort();
        self.exit_status
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// OS process id, while the process has not been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Relay a websocket connection to a freshly spawned analysis server until
/// either side goes away.
pub async fn relay(mut socket: WebSocket, config: &LanguageServerConfig) {
    let (mut session, mut from_server) = match LanguageServerSession::spawn(config) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("{}", e);
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    tracing::info!(pid = ?session.pid(), "Forwarding new client");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            incoming = stream.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => SocketEvent::Message(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => SocketEvent::Message(text),
                        Err(_) => {
                            tracing::warn!("Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(frame) = frame {
                            tracing::debug!(code = frame.code, reason = frame.reason.as_str(), "Close frame");
                        }
                        SocketEvent::Close
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => SocketEvent::Error(e.to_string()),
                    None => SocketEvent::Close,
                };
                if session.handle(event).await == SessionState::Disposed {
                    break;
                }
            }
            outgoing = from_server.recv() => {
                match outgoing {
                    Some(msg) => {
                        if let Err(e) = sink.send(Message::Text(msg.to_string().into())).await {
                            session.handle(SocketEvent::Error(e.to_string())).await;
                            break;
                        }
                    }
                    None => {
                        tracing::info!("Language server exited, closing client");
                        session.dispose().await;
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }
}
