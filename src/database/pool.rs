//! Fixed-capacity connection pool.
//!
//! Every handle is opened up front. A checkout waits on a semaphore permit
//! and then pops an idle handle; dropping the guard pushes the handle back
//! before the permit is returned, so a permit always has a handle behind it.
//!
//! ```rust
//! use schemaql::database::Pool;
//!
//! # tokio_test::block_on(async {
//! let pool = Pool::from_handles(vec!["a", "b"]);
//! let conn = pool.checkout().await.unwrap();
//! assert_eq!(pool.available(), 1);
//! drop(conn);
//! assert_eq!(pool.available(), 2);
//! # });
//! ```

use crate::error::{Result, SchemaqlError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

/// Opens live handles for a pool.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Send + 'static;

    async fn connect(&self) -> Result<Self::Connection>;
}

struct PoolInner<C> {
    semaphore: Arc<Semaphore>,
    idle: Mutex<Vec<C>>,
    capacity: usize,
}

/// A bounded pool of pre-opened handles. Cloning shares the same pool.
pub struct Pool<C> {
    inner: Arc<PoolInner<C>>,
}

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Send + 'static> Pool<C> {
    /// Open `capacity` handles through `connector`. Any failed open fails the
    /// whole pool.
    pub async fn open<K>(connector: &K, capacity: usize) -> Result<Self>
    where
        K: Connector<Connection = C>,
    {
        if capacity == 0 {
            return Err(SchemaqlError::configuration("pool size must be at least 1"));
        }
        let mut handles = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            handles.push(connector.connect().await?);
        }
        info!(capacity, "Connection pool opened");
        Ok(Self::from_handles(handles))
    }

    /// Build a pool around already open handles.
    pub fn from_handles(handles: Vec<C>) -> Self {
        let capacity = handles.len();
        Self {
            inner: Arc::new(PoolInner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                idle: Mutex::new(handles),
                capacity,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Handles not currently checked out.
    pub fn available(&self) -> usize {
        self.inner.semaphore.available_permits()
    }

    /// Wait until a handle is free and take it. There is no timeout.
    pub async fn checkout(&self) -> Result<PooledConnection<C>> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SchemaqlError::configuration(format!("connection pool closed: {e}")))?;
        let handle = self
            .inner
            .idle
            .lock()
            .pop()
            .ok_or_else(|| SchemaqlError::configuration("connection pool has no idle handle"))?;
        debug!(available = self.available(), "Connection checked out");
        Ok(PooledConnection {
            handle: Some(handle),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }
}

/// A checked-out handle. Returned to the pool when dropped.
pub struct PooledConnection<C> {
    handle: Option<C>,
    pool: Arc<PoolInner<C>>,
    // Dropped after `Drop::drop` has pushed the handle back.
    _permit: OwnedSemaphorePermit,
}

impl<C> PooledConnection<C> {
    /// Return the handle explicitly.
    pub fn release(self) {
        drop(self);
    }
}

impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.handle.as_ref().expect("handle is present until drop")
    }
}

impl<C> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.handle.as_mut().expect("handle is present until drop")
    }
}

impl<C> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.idle.lock().push(handle);
        }
    }
}
