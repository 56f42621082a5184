//! Listener lifecycle for the build service.
//!
//! [`start`] prepares the scratch root, binds, and serves [`routes`] on a
//! background task. The returned [`RunningServer`] is the only way to stop
//! it again.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::web::{AppState, routes};
use crate::config::Config;
use crate::error::ChannelError;

/// A server accepting connections on a background task.
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Serve the build API and language server socket on `addr`.
///
/// Port 0 picks a free port; [`RunningServer::local_addr`] reports it.
pub async fn start(addr: SocketAddr, config: Arc<Config>) -> Result<RunningServer, ChannelError> {
    tokio::fs::create_dir_all(&config.scratch_dir)
        .await
        .map_err(|source| ChannelError::ScratchDir {
            path: config.scratch_dir.clone(),
            source,
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ChannelError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ChannelError::Bind { addr, source })?;

    tracing::info!(
        toolchain = %config.toolchain.root.display(),
        scratch = %config.scratch_dir.display(),
        "Listening at {}",
        local_addr
    );

    let app = routes(AppState::new(config));
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Draining connections");
            })
            .await
    });

    Ok(RunningServer {
        local_addr,
        shutdown_tx,
        task,
    })
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight requests finish, and report how the
    /// serve loop ended.
    pub async fn shutdown(self) -> Result<(), ChannelError> {
        let _ = self.shutdown_tx.send(());
        match self.task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ChannelError::Terminated(e.to_string())),
            Err(e) => Err(ChannelError::Terminated(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::config::{LanguageServerConfig, ServerConfig, ToolchainConfig};

    fn config(scratch: &Path) -> Arc<Config> {
        Arc::new(Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            toolchain: ToolchainConfig::new("/nonexistent/toolchain"),
            scratch_dir: scratch.to_path_buf(),
            language_server: LanguageServerConfig::default(),
        })
    }

    fn any_port() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn get_root(addr: SocketAddr) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_liveness_probe_until_shutdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let server = start(any_port(), config(dir.path())).await.unwrap();
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let response = get_root(addr).await;
        assert!(response.starts_with("HTTP/1.1 200"), "got {}", response);
        assert!(response.ends_with("ok"));

        server.shutdown().await.unwrap();
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_creates_missing_scratch_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let scratch = dir.path().join("nested").join("scratch");
        let server = start(any_port(), config(&scratch)).await.unwrap();
        assert!(scratch.is_dir());
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unusable_scratch_root_fails_before_binding() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let err = start(any_port(), config(&blocker.join("scratch")))
            .await
            .err()
            .expect("scratch root below a file cannot be created");
        assert!(matches!(err, ChannelError::ScratchDir { .. }));
    }

    #[tokio::test]
    async fn test_occupied_port_is_bind_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let listener = tokio::net::TcpListener::bind(any_port()).await.unwrap();
        let occupied = listener.local_addr().unwrap();

        match start(occupied, config(dir.path())).await.err() {
            Some(ChannelError::Bind { addr, .. }) => assert_eq!(addr, occupied),
            other => panic!("expected bind error, got {:?}", other.map(|e| e.to_string())),
        }
    }
}
