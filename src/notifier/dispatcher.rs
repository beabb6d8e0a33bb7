use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::{Notification, NotificationChannel, NotificationError, Permission, SubscriptionStore};
use crate::clients::{BoardSnapshot, OrderFeed};
use crate::domain::{IdentityContext, Order, OrderStatus};

/// Finds orders that moved from `Preparing` to `Ready` between two
/// consecutive snapshots. An order never seen as `Preparing` does not count.
#[derive(Debug, Default)]
pub struct ReadyEdgeDetector {
    previous: HashMap<String, OrderStatus>,
}

impl ReadyEdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, board: &BoardSnapshot) -> Vec<Order> {
        let edges = board
            .orders
            .iter()
            .filter(|order| {
                order.status == OrderStatus::Ready
                    && self.previous.get(&order.id) == Some(&OrderStatus::Preparing)
            })
            .cloned()
            .collect();

        self.previous = board
            .orders
            .iter()
            .map(|order| (order.id.clone(), order.status))
            .collect();

        edges
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    /// Alerts skipped because the channel is not permitted.
    pub suppressed: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.delivered + self.suppressed + self.failed == 0
    }
}

/// Sends one ready alert per subscriber per `Preparing -> Ready` edge.
pub struct NotificationDispatcher {
    identity: IdentityContext,
    subscriptions: Arc<dyn SubscriptionStore>,
    channel: Arc<dyn NotificationChannel>,
    detector: ReadyEdgeDetector,
    permission_requested: bool,
    unavailable_reported: bool,
}

impl NotificationDispatcher {
    pub fn new(
        identity: IdentityContext,
        subscriptions: Arc<dyn SubscriptionStore>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            identity,
            subscriptions,
            channel,
            detector: ReadyEdgeDetector::new(),
            permission_requested: false,
            unavailable_reported: false,
        }
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    /// Turns the ready alert for `order_id` on or off for the current
    /// customer. Returns whether the customer is now subscribed.
    #[instrument(fields(customer = %self.identity.id), skip(self))]
    pub async fn toggle_subscription(
        &self,
        order_id: &str,
        subscribe: bool,
    ) -> Result<bool, NotificationError> {
        let changed = if subscribe {
            self.subscriptions.add(&self.identity.id, order_id).await?
        } else {
            self.subscriptions.remove(&self.identity.id, order_id).await?
        };
        debug!(changed, "Subscription toggled");
        Ok(subscribe)
    }

    pub async fn subscriptions(&self) -> Result<BTreeSet<String>, NotificationError> {
        self.subscriptions.subscriptions_of(&self.identity.id).await
    }

    /// Diffs `board` against the previous snapshot and alerts the current
    /// customer for every subscribed order that just became ready.
    #[instrument(fields(owner = %self.identity, version = board.version), skip(self, board))]
    pub async fn handle_snapshot(&mut self, board: &BoardSnapshot) -> DispatchReport {
        let mut report = DispatchReport::default();

        for order in self.detector.observe(board) {
            // Claim the entry before alerting: it fires once, even across
            // sessions sharing the store, and whether or not delivery works.
            match self.subscriptions.remove(&self.identity.id, &order.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(order_id = %order.id, "Order ready, not subscribed");
                    continue;
                }
                Err(e) => {
                    error!(order_id = %order.id, error = %e, "Could not claim subscription");
                    report.failed += 1;
                    continue;
                }
            }

            if self.ensure_permission().await.is_err() {
                report.suppressed += 1;
                continue;
            }

            let notification = Notification::order_ready(self.identity.id.clone(), &order);
            match self.channel.deliver(&notification).await {
                Ok(()) => {
                    info!(order_id = %order.id, coupon = %order.coupon_number, "Ready alert delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Ready alert failed");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Asks for permission at most once per session; warns once if alerts are
    /// unavailable.
    async fn ensure_permission(&mut self) -> Result<(), NotificationError> {
        let mut permission = self.channel.permission().await;
        if permission == Permission::Undetermined && !self.permission_requested {
            self.permission_requested = true;
            permission = self.channel.request_permission().await;
            info!(%permission, "Notification permission requested");
        }

        if permission == Permission::Granted {
            return Ok(());
        }
        if !self.unavailable_reported {
            self.unavailable_reported = true;
            warn!(%permission, "Ready alerts unavailable, continuing silently");
        }
        Err(NotificationError::Unavailable(permission))
    }

    /// Consumes `feed` until it closes or `stop` fires.
    #[instrument(name = "notification_dispatcher", fields(owner = %self.identity), skip_all)]
    pub async fn run(mut self, mut feed: OrderFeed, mut stop: oneshot::Receiver<()>) {
        info!("NotificationDispatcher starting");

        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    info!("NotificationDispatcher stop requested");
                    break;
                }
                next = feed.next() => match next {
                    Some(board) => {
                        let report = self.handle_snapshot(&board).await;
                        if !report.is_empty() {
                            debug!(?report, "Snapshot dispatched");
                        }
                    }
                    None => {
                        info!("Order feed closed");
                        break;
                    }
                },
            }
        }

        feed.unsubscribe();
        info!("NotificationDispatcher stopped");
    }

    pub fn spawn(self, feed: OrderFeed) -> DispatcherHandle {
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(feed, stop_rx));
        DispatcherHandle { stop, task }
    }
}

/// Owner of a running dispatcher task.
pub struct DispatcherHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Releases the feed and waits for the task to finish.
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.stop.send(());
        self.task.await
    }
}
