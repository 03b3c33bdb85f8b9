//! Connection registry: the authoritative table of currently active sessions.
//!
//! All mutation goes through the operations defined here; session logic never
//! reaches into the map directly. The map lives behind a `tokio::sync::RwLock`
//! so snapshots are taken at a consistent point in time and a rename is
//! visible to every snapshot or broadcast issued after it returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use tokio::sync::{RwLock, RwLockReadGuard, mpsc};
use uuid::Uuid;

use irori_shared::protocol::UserInfo;

/// One registered connection.
///
/// The mailbox sender is the connection's outbound handle: broadcasts push
/// into it without ever blocking on the socket.
pub struct Connection {
    pub name: String,
    pub ip: String,
    pub connected_at: i64,
    seq: u64,
    sender: mpsc::Sender<Message>,
    dropped: AtomicU64,
}

/// Outcome of a non-blocking push into a connection's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Mailbox saturated; the pushed frame was discarded (drop-newest).
    Full,
    /// Receiver side is gone; the session is on its way out.
    Closed,
}

impl Connection {
    /// Push a frame into this connection's mailbox without blocking.
    ///
    /// A saturated mailbox discards the frame being pushed and records the
    /// drop on this connection's counter.
    pub(crate) fn push(&self, msg: Message) -> PushOutcome {
        match self.sender.try_send(msg) {
            Ok(()) => PushOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                PushOutcome::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => PushOutcome::Closed,
        }
    }

    /// Frames dropped against this connection because its mailbox was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Snapshot of a session returned by [`Registry::deregister`].
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub name: String,
    pub ip: String,
    pub connected_at: i64,
}

/// Concurrent-safe map of connection id to session state.
#[derive(Default)]
pub struct Registry {
    connections: RwLock<HashMap<Uuid, Connection>>,
    join_seq: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection with its initial (guest) name.
    pub async fn register(
        &self,
        id: Uuid,
        name: String,
        ip: String,
        connected_at: i64,
        sender: mpsc::Sender<Message>,
    ) {
        let seq = self.join_seq.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.write().await;
        connections.insert(
            id,
            Connection {
                name,
                ip,
                connected_at,
                seq,
                sender,
                dropped: AtomicU64::new(0),
            },
        );
    }

    /// Remove a connection, returning a snapshot of its final state.
    pub async fn deregister(&self, id: Uuid) -> Option<SessionSnapshot> {
        let mut connections = self.connections.write().await;
        connections.remove(&id).map(|conn| SessionSnapshot {
            name: conn.name,
            ip: conn.ip,
            connected_at: conn.connected_at,
        })
    }

    /// Change a connection's display name, returning the previous name.
    pub async fn rename(&self, id: Uuid, new_name: String) -> Option<String> {
        let mut connections = self.connections.write().await;
        let conn = connections.get_mut(&id)?;
        Some(std::mem::replace(&mut conn.name, new_name))
    }

    /// The display name a connection has right now.
    pub async fn current_name(&self, id: Uuid) -> Option<String> {
        let connections = self.connections.read().await;
        connections.get(&id).map(|conn| conn.name.clone())
    }

    /// Point-in-time list of connected users, ordered by join time.
    pub async fn snapshot(&self) -> Vec<UserInfo> {
        let connections = self.connections.read().await;
        let mut users: Vec<(u64, UserInfo)> = connections
            .iter()
            .map(|(id, conn)| {
                (
                    conn.seq,
                    UserInfo {
                        id: id.to_string(),
                        name: conn.name.clone(),
                        ip: conn.ip.clone(),
                    },
                )
            })
            .collect();
        users.sort_by_key(|(seq, _)| *seq);
        users.into_iter().map(|(_, user)| user).collect()
    }

    /// Number of currently registered connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Read guard over the connection table, for fan-out.
    pub(crate) async fn connections(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Connection>> {
        self.connections.read().await
    }
}
