//! Token-bucket rate limiting over three independent keys per attempt.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::config::BucketConfig;

use super::store::{BucketStore, BucketStoreError, StagedWrite};

const MAX_RETRIES: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RateLimiterError {
    #[error("rate limiter busy, retries exhausted")]
    Busy,

    #[error("{0}")]
    Store(String),
}

impl From<BucketStoreError> for RateLimiterError {
    fn from(err: BucketStoreError) -> Self {
        match err {
            BucketStoreError::TxnConflict => RateLimiterError::Busy,
            BucketStoreError::Io(msg) => RateLimiterError::Store(msg),
        }
    }
}

/// Per-bucket verdict: whether the debit was admitted and the token count
/// left in the bucket afterward (refilled count if rejected).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllowOutcome {
    pub allowed: bool,
    pub remaining: f64,
}

/// Combined verdict and per-bucket diagnostics for a `(login, password, ip)`
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckAllOutcome {
    pub allowed: bool,
    pub login: bool,
    pub pass: bool,
    pub ip: bool,
}

pub struct RateLimiter {
    store: BucketStore,
    key_ttl: Duration,
    login_cfg: BucketConfig,
    pass_cfg: BucketConfig,
    ip_cfg: BucketConfig,
}

fn wall_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    hex::encode(digest)
}

/// Pure refill-and-debit step, split out from the transaction plumbing so it
/// can be unit tested without a store: given the bucket's current state and
/// `now`, decide whether `requested` tokens can be taken.
fn refill_and_debit(
    tokens: f64,
    last_ts: f64,
    now: f64,
    cfg: BucketConfig,
    requested: f64,
) -> AllowOutcome {
    let delta = (now - last_ts).max(0.0);
    let refill_per_sec = cfg.refill_per_minute as f64 / 60.0;
    let new_tokens = (tokens + delta * refill_per_sec).min(cfg.capacity as f64);

    if new_tokens >= requested {
        AllowOutcome {
            allowed: true,
            remaining: new_tokens - requested,
        }
    } else {
        AllowOutcome {
            allowed: false,
            remaining: new_tokens,
        }
    }
}

impl RateLimiter {
    pub fn new(
        store: BucketStore,
        key_ttl: Duration,
        login_cfg: BucketConfig,
        pass_cfg: BucketConfig,
        ip_cfg: BucketConfig,
    ) -> Self {
        Self {
            store,
            key_ttl,
            login_cfg,
            pass_cfg,
            ip_cfg,
        }
    }

    /// Debit `requested` tokens from `key`, retrying on optimistic-lock
    /// conflicts up to [`MAX_RETRIES`] times.
    pub async fn allow(
        &self,
        key: &str,
        cfg: BucketConfig,
        requested: u32,
    ) -> Result<AllowOutcome, RateLimiterError> {
        let key_ttl = self.key_ttl;
        for _ in 0..MAX_RETRIES {
            let result = self
                .store
                .atomic_update(key, |current| {
                    let now = wall_clock_seconds();
                    let tokens = current
                        .tokens
                        .as_deref()
                        .and_then(|s| s.parse::<f64>().ok())
                        .unwrap_or(cfg.capacity as f64);
                    let last_ts = current
                        .ts
                        .as_deref()
                        .and_then(|s| s.parse::<f64>().ok())
                        .unwrap_or(now);

                    let outcome = refill_and_debit(tokens, last_ts, now, cfg, requested as f64);

                    let write = StagedWrite {
                        tokens: format!("{:.6}", outcome.remaining),
                        ts: format!("{now:.6}"),
                        ttl: key_ttl,
                    };
                    (outcome, write)
                })
                .await;

            match result {
                Ok(outcome) => return Ok(outcome),
                Err(BucketStoreError::TxnConflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(RateLimiterError::Busy)
    }

    /// Debit the login, password, and IP buckets for one authorization
    /// attempt. All three debits execute even if an earlier one rejects;
    /// an error on any debit aborts without rolling back prior debits.
    pub async fn check_all(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> Result<CheckAllOutcome, RateLimiterError> {
        let login_key = format!("bf:login:{login}");
        let pass_key = format!("bf:pass:{}", hash_password(password));
        let ip_key = format!("bf:ip:{ip}");

        let login_outcome = self.allow(&login_key, self.login_cfg, 1).await?;
        let pass_outcome = self.allow(&pass_key, self.pass_cfg, 1).await?;
        let ip_outcome = self.allow(&ip_key, self.ip_cfg, 1).await?;

        Ok(CheckAllOutcome {
            allowed: login_outcome.allowed && pass_outcome.allowed && ip_outcome.allowed,
            login: login_outcome.allowed,
            pass: pass_outcome.allowed,
            ip: ip_outcome.allowed,
        })
    }

    pub async fn reset_ip(&self, ip: &str) -> Result<u64, RateLimiterError> {
        Ok(self.store.scan_delete(&format!("bf:ip:{ip}")).await?)
    }

    pub async fn reset_login(&self, login: &str) -> Result<u64, RateLimiterError> {
        Ok(self.store.scan_delete(&format!("bf:login:{login}")).await?)
    }

    pub async fn reset_all(&self) -> Result<u64, RateLimiterError> {
        Ok(self.store.scan_delete("bf:*").await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(capacity: u32, refill_per_minute: u32) -> BucketConfig {
        BucketConfig {
            capacity,
            refill_per_minute,
        }
    }

    #[test]
    fn burst_then_block() {
        // S1: capacity 5, refill 5/min, six consecutive calls with no time
        // passing between them.
        let c = cfg(5, 5);
        let mut tokens = c.capacity as f64;
        let now = 1_000.0;
        let mut results = Vec::new();
        for _ in 0..6 {
            let outcome = refill_and_debit(tokens, now, now, c, 1.0);
            results.push(outcome.allowed);
            tokens = outcome.remaining;
        }
        assert_eq!(results, vec![true, true, true, true, true, false]);
    }

    #[test]
    fn refill_after_wait_grants_exactly_one_token() {
        // S2: capacity 2, refill 60/min (1 token/sec). Drain, wait 1.1s.
        let c = cfg(2, 60);
        let t0 = 0.0;
        let first = refill_and_debit(2.0, t0, t0, c, 1.0);
        assert!(first.allowed);
        let second = refill_and_debit(first.remaining, t0, t0, c, 1.0);
        assert!(!second.allowed);

        let after_wait = refill_and_debit(second.remaining, t0, t0 + 1.1, c, 1.0);
        assert!(after_wait.allowed);

        let immediate_next = refill_and_debit(after_wait.remaining, t0 + 1.1, t0 + 1.1, c, 1.0);
        assert!(!immediate_next.allowed);
    }

    #[test]
    fn remaining_never_exceeds_capacity_or_drops_below_zero() {
        let c = cfg(3, 3);
        let mut tokens = c.capacity as f64;
        let mut ts = 0.0;
        for step in 0..20 {
            let now = ts + 10.0; // plenty of time to refill fully each step
            let outcome = refill_and_debit(tokens, ts, now, c, 1.0);
            assert!(outcome.remaining >= 0.0 && outcome.remaining <= c.capacity as f64, "step {step}");
            tokens = outcome.remaining;
            ts = now;
        }
    }

    #[test]
    fn clock_regression_is_clamped_to_zero_delta() {
        let c = cfg(5, 300);
        // now < last_ts: delta must clamp to 0, not refill negatively-timed tokens.
        let outcome = refill_and_debit(0.0, 100.0, 50.0, c, 1.0);
        assert!(!outcome.allowed);
        assert_eq!(outcome.remaining, 0.0);
    }

    #[test]
    fn rejected_debit_keeps_refilled_count_not_original() {
        let c = cfg(1, 60);
        // Bucket has 0 tokens, half a second passed: refills to 0.5, which
        // is still short of the 1 requested, but the 0.5 must persist.
        let outcome = refill_and_debit(0.0, 0.0, 0.5, c, 1.0);
        assert!(!outcome.allowed);
        assert!((outcome.remaining - 0.5).abs() < 1e-9);
    }

    #[test]
    fn absent_bucket_behaves_as_full_capacity() {
        // Simulates tokens=None / ts=None by directly using capacity and now.
        let c = cfg(10, 10);
        let now = 12345.0;
        let outcome = refill_and_debit(c.capacity as f64, now, now, c, 1.0);
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, 9.0);
    }

    #[test]
    fn password_hash_is_deterministic_and_never_the_plaintext() {
        let a = hash_password("hunter2");
        let b = hash_password("hunter2");
        assert_eq!(a, b);
        assert_ne!(a, "hunter2");
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn different_passwords_hash_differently() {
        assert_ne!(hash_password("a"), hash_password("b"));
    }
}
