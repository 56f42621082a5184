//! Editor language features over a websocket.
//!
//! A client connects to `/language-server/c`, a dedicated `clangd` (or the
//! configured command) is spawned for it, and JSON-RPC messages are relayed
//! both ways until one side disconnects. Closing the socket always kills the
//! process.

pub mod codec;
pub mod proxy;

pub use codec::{FrameReader, FrameWriter, MAX_FRAME_BYTES};
pub use proxy::{LanguageServerSession, SessionState, SocketEvent, relay};
