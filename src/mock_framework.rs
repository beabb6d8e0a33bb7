//! # Mock Framework
//!
//! Utilities for testing clients and the dispatcher in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_create`] or [`expect_action`] to assert behavior.
//! [`RecordingChannel`] stands in for the alert primitive.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::actor_framework::{ActionOutcome, Entity, ResourceClient, ResourceRequest, Snapshot};
use crate::notifier::{Notification, NotificationChannel, NotificationError, Permission};

/// Creates a mock client and a receiver for asserting requests.
///
/// The client sends messages to a channel the test controls, so the test can
/// answer each request with success, failure, or not at all.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, oneshot::Sender<Result<T, T::Error>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Patch, oneshot::Sender<Result<T, T::Error>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update {
            id,
            patch,
            respond_to,
        }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<oneshot::Sender<Result<Snapshot<T>, T::Error>>> {
    match receiver.recv().await {
        Some(ResourceRequest::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, oneshot::Sender<Result<ActionOutcome<T>, T::Error>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Alert channel that records deliveries instead of showing them.
pub struct RecordingChannel {
    permission: Mutex<Permission>,
    grant_on_request: bool,
    fail_delivery: bool,
    requests: AtomicUsize,
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingChannel {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request: true,
            fail_delivery: false,
            requests: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn denying_requests(mut self) -> Self {
        self.grant_on_request = false;
        self
    }

    pub fn failing_delivery(mut self) -> Self {
        self.fail_delivery = true;
        self
    }

    pub fn permission_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub async fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn permission(&self) -> Permission {
        *self.permission.lock().await
    }

    async fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut permission = self.permission.lock().await;
        if *permission == Permission::Undetermined {
            *permission = if self.grant_on_request {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        *permission
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let permission = *self.permission.lock().await;
        if permission != Permission::Granted {
            return Err(NotificationError::Unavailable(permission));
        }
        if self.fail_delivery {
            return Err(NotificationError::Delivery("alert rejected".to_string()));
        }
        // Let a concurrent session run between claim and delivery.
        tokio::task::yield_now().await;
        self.delivered.lock().await.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_system::Workflow;
    use crate::clients::OrderClient;
    use crate::actor_framework::Disposition;
    use crate::domain::{CouponNumber, CustomerId, IdentityContext, Order, OrderItem, OrderStatus, Transition};
    use crate::order_actor::{OrderAction, OrderError, StatusChange};
    use chrono::Utc;
    use std::sync::Arc;

    fn client() -> (OrderClient, mpsc::Receiver<ResourceRequest<Order>>) {
        let (inner, receiver) = create_mock_client::<Order>(10);
        (OrderClient::new(inner, IdentityContext::staff("till-1"), Workflow::default()), receiver)
    }

    fn order(id: &str, coupon: u32, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            coupon_number: CouponNumber(coupon),
            customer: CustomerId::for_coupon(CouponNumber(coupon)),
            items: vec![OrderItem::coupon_meal()],
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mock_client() {
        let (inner, mut receiver) = create_mock_client::<Order>(10);
        let client = OrderClient::new(inner, IdentityContext::staff("till-1"), Workflow::default());

        let create_task = tokio::spawn(async move { client.add_order(42).await });

        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(params.coupon_number, CouponNumber(42));
        assert_eq!(params.initial_status, OrderStatus::Preparing);
        responder
            .send(Err(OrderError::DuplicateCoupon(CouponNumber(42))))
            .unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Err(OrderError::DuplicateCoupon(CouponNumber(42))));
    }

    #[tokio::test]
    async fn advance_sends_an_action() {
        let (client, mut receiver) = client();
        let task = tokio::spawn(async move { client.advance_order("o1".to_string()).await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "o1");
        assert!(matches!(action, OrderAction::Advance));
        responder
            .send(Ok(ActionOutcome {
                entity: order("o1", 3, OrderStatus::Ready),
                result: StatusChange {
                    from: OrderStatus::Preparing,
                    to: OrderStatus::Ready,
                    transition: Transition::Advance,
                },
                disposition: Disposition::Retained,
            }))
            .unwrap();

        let update = task.await.unwrap().unwrap();
        assert_eq!(update.order.status, OrderStatus::Ready);
        assert!(!update.is_removed());
    }

    #[tokio::test]
    async fn coupon_correction_sends_a_patch() {
        let (client, mut receiver) = client();
        let task = tokio::spawn(async move {
            client.update_order_coupon("o1".to_string(), CouponNumber(8)).await
        });

        let (id, patch, responder) = expect_update(&mut receiver).await.expect("Expected Update request");
        assert_eq!(id, "o1");
        assert_eq!(patch.coupon_number, Some(CouponNumber(8)));
        assert!(patch.items.is_none());
        responder
            .send(Err(OrderError::DuplicateCoupon(CouponNumber(8))))
            .unwrap();

        assert_eq!(task.await.unwrap(), Err(OrderError::DuplicateCoupon(CouponNumber(8))));
    }

    #[tokio::test]
    async fn status_query_filters_the_listing() {
        let (client, mut receiver) = client();
        let task = tokio::spawn(async move { client.get_orders_by_status(OrderStatus::Ready).await });

        let responder = expect_list(&mut receiver).await.expect("Expected List request");
        responder
            .send(Ok(Snapshot {
                version: 4,
                items: Arc::new(vec![
                    order("o1", 1, OrderStatus::Preparing),
                    order("o2", 2, OrderStatus::Ready),
                ]),
            }))
            .unwrap();

        let ready = task.await.unwrap().unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, "o2");
    }
}
