//! Network channels into the service.
//!
//! ```text
//!   HTTP client ── POST /api/build ──────────▶ BuildOrchestrator
//!   editor ─────── GET /language-server/c ──▶ LanguageServerSession ◀──▶ clangd
//! ```
//!
//! [`http_server`] owns the listener; [`web`] defines the routes.

pub mod http_server;
pub mod web;

pub use http_server::{RunningServer, start};
pub use web::{AppState, routes};
