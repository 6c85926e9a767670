use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

use parley_types::events::GatewayEvent;

/// Tracks which users currently hold a live gateway connection and
/// delivers events to them.
///
/// One entry per user: a new connection for the same user evicts the old
/// one (its event channel is dropped, ending its send loop). All presence
/// changes fan out a full `getOnlineUsers` snapshot over the broadcast
/// channel so every client's online view converges on the registry.
#[derive(Clone)]
pub struct Presence {
    inner: Arc<PresenceInner>,
}

struct PresenceInner {
    /// Broadcast channel for events every connected client should see.
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// user_id -> (conn_id, targeted sender). conn_id disambiguates a
    /// stale disconnect from the connection that currently owns the entry.
    connections: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Presence {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(PresenceInner {
                broadcast_tx,
                connections: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to presence broadcasts. Subscribe before registering so
    /// the snapshot triggered by your own registration is not missed.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Register a connection for a user, replacing any prior entry.
    /// Returns (conn_id, targeted event receiver) and broadcasts a fresh
    /// snapshot to all clients.
    pub async fn register(&self, user_id: Uuid) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut connections = self.inner.connections.write().await;
            connections.insert(user_id, (conn_id, tx));
        }
        self.broadcast_snapshot().await;
        (conn_id, rx)
    }

    /// Remove a user's entry, but only if `conn_id` still owns it — a
    /// stale disconnect must not evict a newer connection.
    pub async fn unregister(&self, user_id: Uuid, conn_id: Uuid) {
        let removed = {
            let mut connections = self.inner.connections.write().await;
            match connections.get(&user_id) {
                Some((stored, _)) if *stored == conn_id => {
                    connections.remove(&user_id);
                    true
                }
                _ => false,
            }
        };

        if removed {
            self.broadcast_snapshot().await;
        }
    }

    /// Best-effort push to a single user. An absent or closed connection
    /// is the expected offline case; the caller must not treat delivery
    /// as durable — the store is.
    pub async fn push(&self, user_id: Uuid, event: GatewayEvent) {
        let connections = self.inner.connections.read().await;
        if let Some((_, tx)) = connections.get(&user_id) {
            let _ = tx.send(event);
        }
    }

    /// Current set of online user ids.
    pub async fn online_users(&self) -> Vec<Uuid> {
        self.inner
            .connections
            .read()
            .await
            .keys()
            .copied()
            .collect()
    }

    async fn broadcast_snapshot(&self) {
        let snapshot = self.online_users().await;
        let _ = self
            .inner
            .broadcast_tx
            .send(GatewayEvent::OnlineUsers(snapshot));
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}
