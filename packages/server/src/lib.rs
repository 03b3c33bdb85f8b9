//! WebSocket chat relay server.
//!
//! The core pieces: a concurrent [`registry::Registry`] of connected users,
//! a [`broadcast::Broadcaster`] that fans frames out into bounded
//! per-connection mailboxes, the [`session`] state machine driving each
//! connection, per-session [`rate_limit`] windows, and a [`metrics`]
//! aggregator answering status queries. The optional AI integration lives
//! behind the [`ai::AiProvider`] trait.

pub mod ai;
pub mod broadcast;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod registry;
pub mod runner;
pub mod session;
mod signal;
pub mod state;

pub use runner::{build_router, run_server};
