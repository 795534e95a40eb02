use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tembea_core::client::{ClientError, RemoteClient, SubscriptionSpec};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{oneshot, watch};
use tracing::debug;

/// Lifecycle of a view instance: `Idle → Loading → {Ready | Errored}`,
/// re-entering `Loading` on every fetch, including notification-triggered
/// ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Errored,
}

/// What a view exposes to its consumers: the current data, a loading flag,
/// and the last fetch failure as a plain message.
#[derive(Debug, Clone)]
pub struct ResourceState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: Phase,
}

/// One conceptual resource: how to load it, which change stream keeps it
/// fresh, and what its scoped-out shape looks like.
#[async_trait]
pub trait ResourceQuery: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// The result used before the first fetch and when the view
    /// short-circuits.
    fn empty(&self) -> Self::Output;

    /// `false` short-circuits the view: no query is issued and no stream is
    /// opened (user-scoped resources with no signed-in identity).
    fn is_ready(&self) -> bool {
        true
    }

    /// The change stream to hold open while this query is active.
    fn subscription(&self) -> Option<SubscriptionSpec>;

    /// Whether a failed fetch keeps the previously displayed data (list
    /// views) or resets to empty (singleton views).
    fn keeps_data_on_error(&self) -> bool {
        true
    }

    async fn load(&self, client: &dyn RemoteClient) -> Result<Self::Output, ClientError>;
}

struct Listener {
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

/// A read-and-stay-fresh view over one remote resource.
///
/// Every change notification triggers a full refetch; there is no diffing
/// and no request queue. Fetches racing within one generation resolve
/// last-writer-wins. Teardown and parameter changes bump the generation so
/// responses from a previous life are discarded instead of writing into a
/// view that no longer wants them.
pub struct ResourceView<Q: ResourceQuery> {
    client: Arc<dyn RemoteClient>,
    query: Mutex<Arc<Q>>,
    state: watch::Sender<ResourceState<Q::Output>>,
    generation: AtomicU64,
    listener: Mutex<Option<Listener>>,
}

impl<Q: ResourceQuery> ResourceView<Q> {
    pub fn new(client: Arc<dyn RemoteClient>, query: Q) -> Arc<Self> {
        let initial = ResourceState {
            data: query.empty(),
            loading: false,
            error: None,
            phase: Phase::Idle,
        };
        let (state, _) = watch::channel(initial);
        Arc::new(Self {
            client,
            query: Mutex::new(Arc::new(query)),
            state,
            generation: AtomicU64::new(0),
            listener: Mutex::new(None),
        })
    }

    /// Initial fetch plus the change-stream listener. Call once per mount.
    pub async fn start(self: &Arc<Self>) {
        self.attach_listener();
        self.fetch().await;
    }

    /// Force a reload, e.g. after a local mutation, instead of waiting for
    /// the change notification.
    pub async fn refetch(&self) {
        self.fetch().await;
    }

    /// Parameter change: discard anything still in flight, swap the query,
    /// re-subscribe, and reload.
    pub async fn restart(self: &Arc<Self>, query: Q) {
        self.generation.fetch_add(1, AtomicOrdering::SeqCst);
        self.detach_listener().await;
        {
            let mut slot = self.query.lock().expect("view query lock poisoned");
            *slot = Arc::new(query);
        }
        self.attach_listener();
        self.fetch().await;
    }

    /// Unmount: close the stream and make any in-flight response a no-op.
    pub async fn teardown(&self) {
        self.generation.fetch_add(1, AtomicOrdering::SeqCst);
        self.detach_listener().await;
    }

    pub fn state(&self) -> watch::Receiver<ResourceState<Q::Output>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ResourceState<Q::Output> {
        self.state.borrow().clone()
    }

    async fn fetch(&self) {
        let generation = self.generation.load(AtomicOrdering::SeqCst);
        let query = {
            self.query
                .lock()
                .expect("view query lock poisoned")
                .clone()
        };

        if !query.is_ready() {
            self.state.send_modify(|s| {
                s.data = query.empty();
                s.loading = false;
                s.error = None;
                s.phase = Phase::Ready;
            });
            return;
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = Phase::Loading;
        });

        let result = query.load(self.client.as_ref()).await;

        // A response from a previous generation belongs to a torn-down view
        // or superseded parameters; drop it silently.
        if self.generation.load(AtomicOrdering::SeqCst) != generation {
            debug!("discarding stale fetch response");
            return;
        }

        match result {
            Ok(data) => self.state.send_modify(|s| {
                s.data = data;
                s.error = None;
                s.loading = false;
                s.phase = Phase::Ready;
            }),
            Err(e) => self.state.send_modify(|s| {
                if !query.keeps_data_on_error() {
                    s.data = query.empty();
                }
                s.error = Some(e.to_string());
                s.loading = false;
                s.phase = Phase::Errored;
            }),
        }
    }

    fn attach_listener(self: &Arc<Self>) {
        let query = {
            self.query
                .lock()
                .expect("view query lock poisoned")
                .clone()
        };
        if !query.is_ready() {
            return;
        }
        let Some(spec) = query.subscription() else {
            return;
        };

        let mut subscription = self.client.subscribe(spec);
        let client = Arc::clone(&self.client);
        let weak = Arc::downgrade(self);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = subscription.receiver.recv() => match event {
                        // One notification, one refetch; a lagged stream
                        // also just reloads.
                        Ok(_) | Err(RecvError::Lagged(_)) => match weak.upgrade() {
                            Some(view) => view.fetch().await,
                            None => break,
                        },
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            client.unsubscribe(subscription);
        });

        let replaced = self
            .listener
            .lock()
            .expect("view listener lock poisoned")
            .replace(Listener {
                stop: stop_tx,
                task,
            });
        debug_assert!(replaced.is_none(), "listener attached twice");
    }

    async fn detach_listener(&self) {
        let listener = self
            .listener
            .lock()
            .expect("view listener lock poisoned")
            .take();
        if let Some(listener) = listener {
            let _ = listener.stop.send(());
            let _ = listener.task.await;
        }
    }
}
