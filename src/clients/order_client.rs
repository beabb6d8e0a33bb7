use tracing::{debug, info, instrument, warn};

use super::feed::{BoardSnapshot, OrderFeed, StatusFilter};
use crate::actor_framework::{Disposition, ResourceClient};
use crate::app_system::Workflow;
use crate::domain::{CouponNumber, CustomerId, IdentityContext, Order, OrderCreate, OrderPatch, OrderStatus};
use crate::order_actor::{OrderAction, OrderError, StatusChange};

/// Result of a status change. A completed order may have been removed from
/// the store, depending on the completion policy.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order: Order,
    pub change: StatusChange,
    pub disposition: Disposition,
}

impl StatusUpdate {
    pub fn is_removed(&self) -> bool {
        self.disposition == Disposition::Removed
    }
}

/// Client for the order store.
///
/// Every write is forwarded to the single order actor, which checks the
/// coupon invariant and persists the change in one step.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    identity: IdentityContext,
    workflow: Workflow,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, identity: IdentityContext, workflow: Workflow) -> Self {
        Self {
            inner,
            identity,
            workflow,
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn workflow(&self) -> Workflow {
        self.workflow
    }

    /// Enters a coupon with the default meal, in the workflow's start status.
    pub async fn add_order(&self, coupon: impl Into<CouponNumber>) -> Result<Order, OrderError> {
        let params = OrderCreate::coupon(coupon).starting_at(self.workflow.start_status);
        self.add_order_with(params).await
    }

    #[instrument(fields(actor = %self.identity, coupon = %params.coupon_number), skip(self, params))]
    pub async fn add_order_with(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!("Sending request");
        match self.inner.create(params).await {
            Ok(order) => {
                info!(order_id = %order.id, status = %order.status, "Order added");
                Ok(order)
            }
            Err(e @ OrderError::DuplicateCoupon(_)) => {
                warn!("Coupon is already in the queue");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Order could not be added");
                Err(e)
            }
        }
    }

    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn update_order_status(
        &self,
        id: String,
        status: OrderStatus,
    ) -> Result<StatusUpdate, OrderError> {
        self.apply(id, OrderAction::SetStatus(status)).await
    }

    /// Moves the order one step forward.
    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn advance_order(&self, id: String) -> Result<StatusUpdate, OrderError> {
        self.apply(id, OrderAction::Advance).await
    }

    /// Staff override: a `Ready` order goes back to `Preparing`.
    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn send_back(&self, id: String) -> Result<StatusUpdate, OrderError> {
        self.apply(id, OrderAction::SendBack).await
    }

    async fn apply(&self, id: String, action: OrderAction) -> Result<StatusUpdate, OrderError> {
        debug!(?action, "Sending request");
        let outcome = self.inner.perform_action(id, action).await.map_err(|e| {
            warn!(error = %e, "Status change rejected");
            e
        })?;

        let update = StatusUpdate {
            order: outcome.entity,
            change: outcome.result,
            disposition: outcome.disposition,
        };
        info!(
            order_id = %update.order.id,
            coupon = %update.order.coupon_number,
            from = %update.change.from,
            to = %update.change.to,
            removed = update.is_removed(),
            "Order status changed"
        );
        Ok(update)
    }

    /// Corrects a mis-entered coupon number.
    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn update_order_coupon(
        &self,
        id: String,
        coupon: CouponNumber,
    ) -> Result<Order, OrderError> {
        debug!("Sending request");
        let patch = OrderPatch {
            coupon_number: Some(coupon),
            ..OrderPatch::default()
        };
        match self.inner.update(id, patch).await {
            Ok(order) => {
                info!(order_id = %order.id, "Coupon corrected");
                Ok(order)
            }
            Err(e) => {
                warn!(error = %e, "Coupon correction rejected");
                Err(e)
            }
        }
    }

    /// Current orders matching `filter`, oldest first.
    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn board(&self, filter: StatusFilter) -> Result<BoardSnapshot, OrderError> {
        debug!("Sending request");
        let snapshot = self.inner.list().await?;
        Ok(BoardSnapshot::from_snapshot(&snapshot, &filter))
    }

    pub async fn active_orders(&self) -> Result<BoardSnapshot, OrderError> {
        self.board(StatusFilter::Active).await
    }

    pub async fn get_orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        Ok(self.board(StatusFilter::only([status])).await?.orders)
    }

    pub async fn get_orders_by_student(&self, customer: &CustomerId) -> Result<Vec<Order>, OrderError> {
        let board = self.board(StatusFilter::All).await?;
        Ok(board
            .orders
            .into_iter()
            .filter(|order| &order.customer == customer)
            .collect())
    }

    /// Opens a live view of the board.
    #[instrument(fields(actor = %self.identity), skip(self))]
    pub async fn subscribe(&self, filter: StatusFilter) -> Result<OrderFeed, OrderError> {
        debug!("Sending request");
        let feed = self.inner.subscribe().await?;
        Ok(OrderFeed::new(feed, filter))
    }

    pub async fn shutdown(&self) -> Result<(), OrderError> {
        self.inner.shutdown().await
    }
}

impl_client_methods!(OrderClient, Order, OrderError, order);
