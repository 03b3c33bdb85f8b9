//! Broadcast engine: fan-out of one frame to every registered connection.
//!
//! The payload is serialized once, then pushed into each connection's bounded
//! mailbox with `try_send`. A slow or vanished receiver never delays delivery
//! to anyone else. Drop policy is drop-newest: when a mailbox is full, the
//! frame being delivered to that connection is discarded and counted.

use std::sync::Arc;

use axum::extract::ws::Message;
use tracing::{debug, warn};
use uuid::Uuid;

use irori_shared::protocol::{self, Outbound};

use crate::metrics::Metrics;
use crate::registry::{PushOutcome, Registry};

#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>, metrics: Arc<Metrics>) -> Self {
        Self { registry, metrics }
    }

    /// Deliver `frame` to every registered connection except `except`.
    ///
    /// The receiver set is the point-in-time content of the registry: a
    /// connection joining mid-broadcast may or may not see this frame, and a
    /// connection that already left simply is not in the set.
    pub async fn broadcast(&self, frame: &Outbound, except: Option<Uuid>) {
        let text = protocol::encode(frame);

        let connections = self.registry.connections().await;
        let mut delivered = 0usize;
        let mut dropped = 0usize;
        for (id, conn) in connections.iter() {
            if except.is_some_and(|ex| ex == *id) {
                continue;
            }
            match conn.push(Message::Text(text.clone().into())) {
                PushOutcome::Delivered => delivered += 1,
                PushOutcome::Full => {
                    dropped += 1;
                    self.metrics.record_broadcast_drop();
                    warn!(
                        id = %id,
                        total_drops = conn.dropped(),
                        "mailbox full, dropping frame for slow client"
                    );
                }
                PushOutcome::Closed => {
                    // Session teardown is already in progress for this one.
                    debug!(id = %id, "mailbox closed, skipping");
                }
            }
        }

        debug!(
            kind = frame.kind(),
            delivered,
            dropped,
            except = ?except,
            "broadcast frame"
        );
    }
}
