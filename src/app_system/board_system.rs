use tracing::{error, info, instrument};
use uuid::Uuid;

use super::BoardConfig;
use crate::actor_framework::ResourceActor;
use crate::clients::{OrderClient, StatusFilter};
use crate::domain::{IdentityContext, Order};
use crate::notifier::{DispatcherHandle, NotificationDispatcher};
use crate::order_actor::OrderError;
use crate::storage::{InMemoryRepository, Repository};

/// The running board: the order actor plus any notification dispatchers.
///
/// Responsible for starting the actors, wiring them together, and shutting
/// them down in dependency order.
pub struct BoardSystem {
    pub order_client: OrderClient,
    dispatchers: Vec<DispatcherHandle>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl BoardSystem {
    /// Starts the board on an in-memory store.
    pub fn new(config: &BoardConfig, identity: IdentityContext) -> Self {
        Self::with_repository(config, identity, InMemoryRepository::<Order>::new())
    }

    #[instrument(name = "board_system", skip(config, repository), fields(actor = %identity))]
    pub fn with_repository(
        config: &BoardConfig,
        identity: IdentityContext,
        repository: impl Repository<Order> + 'static,
    ) -> Self {
        info!(workflow = ?config.workflow, "Starting board system");

        let next_order_id = || Uuid::new_v4().to_string();
        let (order_actor, order_resource_client) =
            ResourceActor::<Order>::new(config.actor_options(), repository, next_order_id);
        let order_client = OrderClient::new(order_resource_client, identity, config.workflow);
        let order_handle = tokio::spawn(order_actor.run());

        info!("Board system started");

        Self {
            order_client,
            dispatchers: Vec::new(),
            handles: vec![order_handle],
        }
    }

    /// Runs `dispatcher` against the live board until shutdown.
    #[instrument(skip_all, fields(owner = %dispatcher.identity()))]
    pub async fn attach_dispatcher(
        &mut self,
        dispatcher: NotificationDispatcher,
    ) -> Result<(), OrderError> {
        let feed = self.order_client.subscribe(StatusFilter::Active).await?;
        self.dispatchers.push(dispatcher.spawn(feed));
        info!(dispatchers = self.dispatchers.len(), "Dispatcher attached");
        Ok(())
    }

    /// Gracefully shut down the board.
    ///
    /// Dispatchers are stopped first so no alert observes a half-stopped
    /// store. Task failures are logged, not propagated.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> Result<(), OrderError> {
        info!("Shutting down board system");

        for dispatcher in self.dispatchers {
            if let Err(e) = dispatcher.stop().await {
                error!(error = ?e, "Dispatcher shutdown error");
            }
        }

        if let Err(e) = self.order_client.shutdown().await {
            error!(error = %e, "Order actor shutdown request failed");
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Actor shutdown error");
            }
        }

        info!("Board system shutdown complete");
        Ok(())
    }
}
