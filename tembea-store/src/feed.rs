use sqlx::postgres::PgListener;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tembea_core::client::{Subscription, SubscriptionSpec};
use tembea_shared::ChangeEvent;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

/// Postgres NOTIFY channel the migration triggers publish on.
pub const PG_NOTIFY_CHANNEL: &str = "tembea_changes";

struct ChannelEntry {
    spec: SubscriptionSpec,
    sender: broadcast::Sender<ChangeEvent>,
}

/// Process-wide change-notification registry, keyed by channel name. Each
/// view instance owns exactly one stream at a time; strict subscribe/
/// unsubscribe pairing keeps delivery single per instance. All access is
/// short critical sections on one lock; delivery itself is lock-free.
#[derive(Default)]
pub struct ChangeFeed {
    channels: Mutex<HashMap<String, ChannelEntry>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a stream for the spec. Equally-scoped subscribers share one
    /// registry entry; every subscriber still gets its own receiver.
    pub fn subscribe(&self, spec: SubscriptionSpec) -> Subscription {
        let channel = spec.channel();
        let mut channels = self.channels.lock().expect("change feed lock poisoned");

        let receiver = match channels.get(&channel) {
            Some(entry) => entry.sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
                channels.insert(
                    channel.clone(),
                    ChannelEntry {
                        spec: spec.clone(),
                        sender,
                    },
                );
                receiver
            }
        };

        debug!(channel, "subscribed");
        Subscription { channel, receiver }
    }

    /// Close a stream. The registry entry is dropped once its last
    /// subscriber is gone.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let Subscription { channel, receiver } = subscription;
        drop(receiver);

        let mut channels = self.channels.lock().expect("change feed lock poisoned");
        if let Some(entry) = channels.get(&channel) {
            if entry.sender.receiver_count() == 0 {
                channels.remove(&channel);
                debug!(channel, "channel closed");
            }
        }
    }

    /// Fan a change event out to every channel whose spec accepts it.
    /// Delivery is fire-and-forget; lagging subscribers lose old events,
    /// which is fine for a subscribe-triggers-reload consumer.
    pub fn publish(&self, event: &ChangeEvent) {
        let channels = self.channels.lock().expect("change feed lock poisoned");
        for entry in channels.values() {
            if entry.spec.accepts(event) {
                let _ = entry.sender.send(event.clone());
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().expect("change feed lock poisoned").len()
    }

    /// Bridge the store's LISTEN/NOTIFY stream into this feed. The
    /// migration installs row triggers that publish one JSON payload per
    /// insert/update/delete on every watched table.
    pub fn attach_pg_listener(self: &Arc<Self>, pool: Pool<Postgres>) -> tokio::task::JoinHandle<()> {
        let feed = Arc::clone(self);
        tokio::spawn(async move {
            let mut listener = match PgListener::connect_with(&pool).await {
                Ok(listener) => listener,
                Err(e) => {
                    warn!("change feed listener failed to connect: {}", e);
                    return;
                }
            };

            if let Err(e) = listener.listen(PG_NOTIFY_CHANNEL).await {
                warn!("change feed listener failed to LISTEN: {}", e);
                return;
            }

            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => feed.publish(&event),
                            Err(e) => {
                                warn!("discarding malformed change payload: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("change feed listener stream ended: {}", e);
                        return;
                    }
                }
            }
        })
    }
}
