//! Backing store contract for resource actors.
//!
//! The actor only commits a change to its in-memory map after the repository
//! accepted it, so an unavailable store never leaves a half-applied write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::actor_framework::Entity;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Transactional create/update/delete keyed by entity id.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn load(&self) -> Result<Vec<T>, StorageError>;
    async fn put(&self, item: &T) -> Result<(), StorageError>;
    async fn remove(&self, id: &T::Id) -> Result<(), StorageError>;
}

pub struct InMemoryRepository<T: Entity> {
    items: Mutex<HashMap<T::Id, T>>,
    available: AtomicBool,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn seeded(items: impl IntoIterator<Item = T>) -> Self {
        let map = items
            .into_iter()
            .map(|item| (item.id().clone(), item))
            .collect();
        Self {
            items: Mutex::new(map),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the store going offline (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    fn ensure_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("in-memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn load(&self) -> Result<Vec<T>, StorageError> {
        self.ensure_available()?;
        Ok(self.items.lock().await.values().cloned().collect())
    }

    async fn put(&self, item: &T) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.items.lock().await.insert(item.id().clone(), item.clone());
        Ok(())
    }

    async fn remove(&self, id: &T::Id) -> Result<(), StorageError> {
        self.ensure_available()?;
        self.items.lock().await.remove(id);
        Ok(())
    }
}

/// Lets tests keep a handle on a repository they handed to an actor.
#[async_trait]
impl<T: Entity, R: Repository<T>> Repository<T> for std::sync::Arc<R> {
    async fn load(&self) -> Result<Vec<T>, StorageError> {
        (**self).load().await
    }

    async fn put(&self, item: &T) -> Result<(), StorageError> {
        (**self).put(item).await
    }

    async fn remove(&self, id: &T::Id) -> Result<(), StorageError> {
        (**self).remove(id).await
    }
}
