use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::storage::{Repository, StorageError};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Errors raised by the actor machinery itself rather than by an entity hook.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;
    type Error: From<FrameworkError> + Display + Debug + Send + Sync + 'static;

    fn id(&self) -> &Self::Id;

    /// Construct the full Entity from the ID and creation parameters
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;

    // --- Store-wide Hooks ---

    /// Checked against every other stored entity before a change is committed.
    fn check_conflict(&self, _other: &Self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A retired entity leaves the store unless the actor retains retired entities.
    fn is_retired(&self) -> bool {
        false
    }
}

/// Full result set published after every committed change.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub version: u64,
    pub items: Arc<Vec<T>>,
}

/// Where an entity ended up after a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retained,
    Removed,
}

#[derive(Debug)]
pub struct ActionOutcome<T: Entity> {
    pub entity: T,
    pub result: T::ActionResult,
    pub disposition: Disposition,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T, T::Error>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>, T::Error>,
    },
    List {
        respond_to: Response<Snapshot<T>, T::Error>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T, T::Error>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<T, T::Error>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<ActionOutcome<T>, T::Error>,
    },
    Subscribe {
        respond_to: oneshot::Sender<Feed<T>>,
    },
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ActorOptions {
    pub buffer_size: usize,
    pub feed_capacity: usize,
    pub retain_retired: bool,
}

impl Default for ActorOptions {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            feed_capacity: 256,
            retain_retired: false,
        }
    }
}

/// Single writer for one entity type. Requests are handled strictly one at a
/// time, so a conflict check and the write that follows it cannot interleave
/// with another request.
pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    repository: Box<dyn Repository<T>>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    bus: broadcast::Sender<Snapshot<T>>,
    version: u64,
    retain_retired: bool,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        options: ActorOptions,
        repository: impl Repository<T> + 'static,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(options.buffer_size);
        let (bus, _) = broadcast::channel(options.feed_capacity.max(1));
        let actor = Self {
            receiver,
            store: HashMap::new(),
            repository: Box::new(repository),
            next_id_fn: Box::new(next_id_fn),
            bus,
            version: 0,
            retain_retired: options.retain_retired,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    #[instrument(name = "resource_actor", skip(self))]
    pub async fn run(mut self) {
        match self.repository.load().await {
            Ok(items) => {
                for item in items {
                    self.store.insert(item.id().clone(), item);
                }
                info!(count = self.store.len(), "ResourceActor starting");
            }
            Err(e) => warn!(error = %e, "Could not hydrate from repository, starting empty"),
        }

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params).await);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.snapshot()));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch).await);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(self.handle_delete(id).await);
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let _ = respond_to.send(self.handle_action(id, action).await);
                }
                ResourceRequest::Subscribe { respond_to } => {
                    // Register before taking the snapshot: nothing can be
                    // published in between because this loop is the only writer.
                    let receiver = self.bus.subscribe();
                    let feed = Feed {
                        initial: Some(self.snapshot()),
                        receiver,
                    };
                    debug!(subscribers = self.bus.receiver_count(), "Feed subscribed");
                    let _ = respond_to.send(feed);
                }
                ResourceRequest::Shutdown => {
                    info!("ResourceActor shutting down");
                    break;
                }
            }
        }

        info!("ResourceActor stopped");
    }

    async fn handle_create(&mut self, params: T::CreateParams) -> Result<T, T::Error> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create_params(id, params)?;
        item.on_create()?;
        let (item, _) = self.commit(item).await?;
        Ok(item)
    }

    async fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        let mut item = self.current(&id)?;
        item.on_update(patch)?;
        let (item, _) = self.commit(item).await?;
        Ok(item)
    }

    async fn handle_action(
        &mut self,
        id: T::Id,
        action: T::Action,
    ) -> Result<ActionOutcome<T>, T::Error> {
        let mut item = self.current(&id)?;
        let result = item.handle_action(action)?;
        let (entity, disposition) = self.commit(item).await?;
        Ok(ActionOutcome {
            entity,
            result,
            disposition,
        })
    }

    async fn handle_delete(&mut self, id: T::Id) -> Result<T, T::Error> {
        let item = self.current(&id)?;
        item.on_delete()?;
        self.repository
            .remove(&id)
            .await
            .map_err(FrameworkError::from)?;
        self.store.remove(&id);
        self.publish();
        Ok(item)
    }

    fn current(&self, id: &T::Id) -> Result<T, T::Error> {
        self.store
            .get(id)
            .cloned()
            .ok_or_else(|| FrameworkError::NotFound(id.to_string()).into())
    }

    /// Validates `candidate` against the rest of the store, writes it through
    /// the repository and only then applies it locally.
    async fn commit(&mut self, candidate: T) -> Result<(T, Disposition), T::Error> {
        for other in self.store.values() {
            if other.id() != candidate.id() {
                candidate.check_conflict(other)?;
            }
        }

        let disposition = if candidate.is_retired() && !self.retain_retired {
            self.repository
                .remove(candidate.id())
                .await
                .map_err(FrameworkError::from)?;
            self.store.remove(candidate.id());
            Disposition::Removed
        } else {
            self.repository
                .put(&candidate)
                .await
                .map_err(FrameworkError::from)?;
            self.store.insert(candidate.id().clone(), candidate.clone());
            Disposition::Retained
        };

        self.publish();
        Ok((candidate, disposition))
    }

    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            version: self.version,
            items: Arc::new(self.store.values().cloned().collect()),
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        // No receivers is fine: nobody is watching yet.
        let _ = self.bus.send(self.snapshot());
    }
}

// =============================================================================
// 4. THE SNAPSHOT FEED
// =============================================================================

/// Ordered stream of snapshots, starting with the state at subscription time.
pub struct Feed<T: Entity> {
    initial: Option<Snapshot<T>>,
    receiver: broadcast::Receiver<Snapshot<T>>,
}

impl<T: Entity> Feed<T> {
    /// Next snapshot, or `None` once the actor has stopped.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            match self.receiver.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Feed fell behind, skipping to newer snapshots");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Releases the subscription. No snapshot is observed afterwards.
    pub fn unsubscribe(self) {}
}

impl<T: Entity> Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("pending_initial", &self.initial.is_some())
            .finish()
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R, T::Error>) -> ResourceRequest<T>,
    ) -> Result<R, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn list(&self) -> Result<Snapshot<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::List { respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<T, T::Error> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<ActionOutcome<T>, T::Error> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    pub async fn subscribe(&self) -> Result<Feed<T>, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ResourceRequest::Subscribe { respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        Ok(response.await.map_err(|_| FrameworkError::ActorDropped)?)
    }

    pub async fn shutdown(&self) -> Result<(), T::Error> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        Ok(())
    }
}

// =============================================================================
// 6. EXAMPLE USAGE (Test)
// =============================================================================
