//! Websocket entry point for editor language features.

use axum::{
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};

use super::AppState;
use crate::language_server;

/// GET /language-server/c - Upgrade and relay to a dedicated analysis server.
pub async fn c_language_server(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let config = state.config.clone();
    ws.on_upgrade(move |socket| async move {
        language_server::relay(socket, &config.language_server).await;
    })
}
