//! Thin async client over a shared Redis instance, providing the one
//! primitive the rate limiter needs: a watched read-modify-write with
//! optimistic conflict detection.
//!
//! `WATCH`/`MULTI`/`EXEC` is only meaningful on a connection that nothing
//! else interleaves commands onto. A [`MultiplexedConnection`] is normally
//! cloned and shared across callers, which would interleave unrelated
//! commands between the watch and the commit; this client instead keeps a
//! pool of connections that are never cloned, so each lease has exclusive
//! use of its connection for the lifetime of one transaction.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum BucketStoreError {
    #[error("transaction conflict")]
    TxnConflict,

    #[error("redis error: {0}")]
    Io(String),
}

impl From<redis::RedisError> for BucketStoreError {
    fn from(err: redis::RedisError) -> Self {
        BucketStoreError::Io(err.to_string())
    }
}

/// Fields of a bucket key as currently stored; absent fields mean the key
/// (or that field within it) doesn't exist yet.
#[derive(Debug, Clone, Default)]
pub struct CurrentFields {
    pub tokens: Option<String>,
    pub ts: Option<String>,
}

/// The write a transaction function stages for a bucket key.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    pub tokens: String,
    pub ts: String,
    pub ttl: Duration,
}

pub struct BucketStore {
    checkin: mpsc::UnboundedSender<MultiplexedConnection>,
    checkout: Mutex<mpsc::UnboundedReceiver<MultiplexedConnection>>,
}

/// A pooled connection, returned to the pool when dropped.
struct Lease {
    conn: Option<MultiplexedConnection>,
    checkin: mpsc::UnboundedSender<MultiplexedConnection>,
}

impl Deref for Lease {
    type Target = MultiplexedConnection;
    fn deref(&self) -> &MultiplexedConnection {
        self.conn.as_ref().expect("lease used after release")
    }
}

impl DerefMut for Lease {
    fn deref_mut(&mut self) -> &mut MultiplexedConnection {
        self.conn.as_mut().expect("lease used after release")
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Receiver side only goes away with the BucketStore itself, so a
            // send failure here means the store is shutting down — fine to
            // drop the connection on the floor.
            let _ = self.checkin.send(conn);
        }
    }
}

impl BucketStore {
    pub async fn connect(redis_addr: &str, pool_size: usize) -> Result<Self, BucketStoreError> {
        let client = redis::Client::open(format!("redis://{redis_addr}"))?;
        let (tx, rx) = mpsc::unbounded_channel();
        for _ in 0..pool_size.max(1) {
            let conn = client.get_multiplexed_async_connection().await?;
            let _ = tx.send(conn);
        }
        Ok(Self {
            checkin: tx,
            checkout: Mutex::new(rx),
        })
    }

    async fn lease(&self) -> Result<Lease, BucketStoreError> {
        let mut rx = self.checkout.lock().await;
        let conn = rx
            .recv()
            .await
            .ok_or_else(|| BucketStoreError::Io("connection pool closed".into()))?;
        Ok(Lease {
            conn: Some(conn),
            checkin: self.checkin.clone(),
        })
    }

    /// Read the `tokens`/`ts` hash fields of `key` without a transaction.
    pub async fn get_fields(&self, key: &str) -> Result<CurrentFields, BucketStoreError> {
        let mut lease = self.lease().await?;
        let tokens: Option<String> = lease.hget(key, "tokens").await?;
        let ts: Option<String> = lease.hget(key, "ts").await?;
        Ok(CurrentFields { tokens, ts })
    }

    /// Watch `key`, run `txn`, and commit its staged write atomically.
    ///
    /// `txn` sees the fields as they stood right before the commit attempt
    /// and returns both the caller's result `T` and the write to stage.
    /// Returns [`BucketStoreError::TxnConflict`] if `key` changed between
    /// the watch and the commit — the caller decides whether to retry.
    pub async fn atomic_update<T, F>(&self, key: &str, txn: F) -> Result<T, BucketStoreError>
    where
        F: FnOnce(CurrentFields) -> (T, StagedWrite),
    {
        let mut lease = self.lease().await?;

        redis::cmd("WATCH").arg(key).query_async::<()>(&mut *lease).await?;

        let tokens: Option<String> = lease.hget(key, "tokens").await?;
        let ts: Option<String> = lease.hget(key, "ts").await?;
        let current = CurrentFields { tokens, ts };

        let (result, write) = txn(current);

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("HSET").arg(key).arg("tokens").arg(&write.tokens).ignore()
            .cmd("HSET").arg(key).arg("ts").arg(&write.ts).ignore()
            .cmd("EXPIRE").arg(key).arg(write.ttl.as_secs() as i64).ignore();

        let committed: Option<()> = pipe.query_async(&mut *lease).await?;

        match committed {
            Some(()) => Ok(result),
            None => Err(BucketStoreError::TxnConflict),
        }
    }

    /// Delete every key matching `pattern` (a Redis glob). Not transactional:
    /// concurrent traffic may recreate keys during the scan.
    pub async fn scan_delete(&self, pattern: &str) -> Result<u64, BucketStoreError> {
        let mut lease = self.lease().await?;
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *lease)
                .await?;

            for key in &keys {
                let _: () = lease.del(key).await?;
                deleted += 1;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }
}
