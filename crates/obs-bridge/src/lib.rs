//! obs-bridge: Remote-control bridge for OBS Studio
//!
//! The bridge supervises a single long-lived OBS WebSocket session, keeps a
//! local mirror of the scene list and current scene in sync with push
//! events, and runs compound operations such as toggling a source in every
//! scene that holds it.

pub mod bridge;
pub mod cache;
pub mod commands;
pub mod operations;
pub mod output;
pub mod session;
pub mod transport;

mod request;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::ObsBridge;
pub use cache::StateCache;
pub use operations::CompoundOps;
pub use session::SessionSupervisor;
pub use transport::WebSocketTransport;
