use async_trait::async_trait;
use schemaql::database::{health_check, Connector, DatabaseConnection, Pool};
use schemaql::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Hands out sequential integers as connection handles.
struct CountingConnector {
    opened: AtomicUsize,
}

#[async_trait]
impl Connector for CountingConnector {
    type Connection = usize;

    async fn connect(&self) -> Result<usize> {
        Ok(self.opened.fetch_add(1, Ordering::SeqCst))
    }
}

#[tokio::test]
async fn test_third_checkout_waits_for_release() {
    let connector = CountingConnector {
        opened: AtomicUsize::new(0),
    };
    let pool = Pool::open(&connector, 2).await.unwrap();
    assert_eq!(connector.opened.load(Ordering::SeqCst), 2);

    let first = pool.checkout().await.unwrap();
    let second = pool.checkout().await.unwrap();
    assert_ne!(*first, *second);
    assert_eq!(pool.available(), 0);

    let blocked = tokio::time::timeout(Duration::from_millis(50), pool.checkout()).await;
    assert!(blocked.is_err(), "checkout should wait while both handles are out");

    let returned = *first;
    drop(first);
    let third = tokio::time::timeout(Duration::from_millis(200), pool.checkout())
        .await
        .expect("released handle becomes available")
        .unwrap();
    assert_eq!(*third, returned);
    drop(second);
    drop(third);
    assert_eq!(pool.available(), 2);
}

#[tokio::test]
async fn test_concurrent_tasks_share_bounded_handles() {
    let connector = CountingConnector {
        opened: AtomicUsize::new(0),
    };
    let pool = Pool::open(&connector, 2).await.unwrap();
    let in_use = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let in_use = Arc::clone(&in_use);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let _conn = pool.checkout().await.unwrap();
                let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_use.fetch_sub(1, Ordering::SeqCst);
            })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(pool.available(), 2);
}

#[tokio::test]
async fn test_sqlite_pool_health_check() {
    let pool = DatabaseConnection::new("sqlite::memory:").pool(2).await.unwrap();
    assert_eq!(pool.capacity(), 2);
    let mut conn = pool.checkout().await.unwrap();
    assert!(health_check(&mut conn).await.unwrap());
}

#[tokio::test]
async fn test_unreachable_database_fails_pool_open() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=ro",
        dir.path().join("missing.db").display()
    );
    let result = DatabaseConnection::new(url).pool(1).await;
    assert!(result.is_err());
}
