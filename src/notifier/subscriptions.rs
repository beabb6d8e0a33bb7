use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::NotificationError;
use crate::domain::CustomerId;

/// The set of order ids each customer wants a ready alert for.
///
/// `add` and `remove` are atomic set operations on one customer's profile.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns whether the entry was newly added.
    async fn add(&self, customer: &CustomerId, order_id: &str) -> Result<bool, NotificationError>;

    /// Returns whether an entry was present.
    async fn remove(&self, customer: &CustomerId, order_id: &str) -> Result<bool, NotificationError>;

    async fn subscriptions_of(&self, customer: &CustomerId) -> Result<BTreeSet<String>, NotificationError>;
}

#[derive(Default)]
pub struct InMemorySubscriptionStore {
    profiles: Mutex<BTreeMap<CustomerId, BTreeSet<String>>>,
    offline: AtomicBool,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), NotificationError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotificationError::Store("subscription store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn add(&self, customer: &CustomerId, order_id: &str) -> Result<bool, NotificationError> {
        self.ensure_available()?;
        let mut profiles = self.profiles.lock().await;
        Ok(profiles
            .entry(customer.clone())
            .or_default()
            .insert(order_id.to_string()))
    }

    async fn remove(&self, customer: &CustomerId, order_id: &str) -> Result<bool, NotificationError> {
        self.ensure_available()?;
        let mut profiles = self.profiles.lock().await;
        let Some(orders) = profiles.get_mut(customer) else {
            return Ok(false);
        };
        let removed = orders.remove(order_id);
        if orders.is_empty() {
            profiles.remove(customer);
        }
        Ok(removed)
    }

    async fn subscriptions_of(&self, customer: &CustomerId) -> Result<BTreeSet<String>, NotificationError> {
        self.ensure_available()?;
        let profiles = self.profiles.lock().await;
        Ok(profiles.get(customer).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_remove_are_idempotent() {
        let store = InMemorySubscriptionStore::new();
        let ana = CustomerId::new("ana");

        assert!(store.add(&ana, "order_7").await.unwrap());
        assert!(!store.add(&ana, "order_7").await.unwrap());
        assert_eq!(store.subscriptions_of(&ana).await.unwrap().len(), 1);

        assert!(store.remove(&ana, "order_7").await.unwrap());
        assert!(!store.remove(&ana, "order_7").await.unwrap());
        assert!(store.subscriptions_of(&ana).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn profiles_are_kept_per_customer() {
        let store = InMemorySubscriptionStore::new();
        let ana = CustomerId::new("ana");
        let ben = CustomerId::new("ben");
        store.add(&ben, "order_7").await.unwrap();
        store.add(&ana, "order_7").await.unwrap();
        store.add(&ana, "order_8").await.unwrap();

        assert!(store.remove(&ana, "order_7").await.unwrap());
        assert_eq!(store.subscriptions_of(&ana).await.unwrap().len(), 1);
        assert!(store.subscriptions_of(&ben).await.unwrap().contains("order_7"));
    }

    #[tokio::test]
    async fn offline_store_reports_errors() {
        let store = InMemorySubscriptionStore::new();
        store.set_available(false);
        let result = store.add(&CustomerId::new("ana"), "order_7").await;
        assert!(matches!(result, Err(NotificationError::Store(_))));
    }
}
