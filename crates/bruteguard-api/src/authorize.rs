//! Orchestrates list lookup and rate limiting into a single verdict.

use crate::bucket::{CheckAllOutcome, RateLimiter, RateLimiterError};
use crate::cidr;
use crate::error::ApiError;
use crate::list_store::ListStore;

/// Outcome of one `(login, password, ip)` attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Allow,
    Reject,
}

/// The rate-checking capability `verdict` needs from a [`RateLimiter`].
/// Exists as a seam so the pipeline can be exercised against a fake in
/// tests without a live bucket store.
pub trait RateCheck {
    fn check_all(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> impl std::future::Future<Output = Result<CheckAllOutcome, RateLimiterError>> + Send;
}

impl RateCheck for RateLimiter {
    async fn check_all(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> Result<CheckAllOutcome, RateLimiterError> {
        RateLimiter::check_all(self, login, password, ip).await
    }
}

/// Decide whether an attempt is permitted.
///
/// List lookups short-circuit before any bucket debit, so a whitelisted or
/// blacklisted source never consumes tokens.
pub async fn verdict<R: RateCheck>(
    list_store: &ListStore,
    rate_limiter: &R,
    login: &str,
    password: &str,
    ip: &str,
) -> Result<Verdict, ApiError> {
    let addr = cidr::parse_bare_ipv4(ip)?;

    if list_store.in_whitelist(addr) {
        return Ok(Verdict::Allow);
    }
    if list_store.in_blacklist(addr) {
        return Ok(Verdict::Reject);
    }

    let outcome = rate_limiter.check_all(login, password, ip).await?;
    if outcome.allowed {
        Ok(Verdict::Allow)
    } else {
        Ok(Verdict::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLimiter {
        outcome: CheckAllOutcome,
        calls: AtomicUsize,
    }

    impl RateCheck for FakeLimiter {
        async fn check_all(
            &self,
            _login: &str,
            _password: &str,
            _ip: &str,
        ) -> Result<CheckAllOutcome, RateLimiterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome)
        }
    }

    fn allowing() -> FakeLimiter {
        FakeLimiter {
            outcome: CheckAllOutcome {
                allowed: true,
                login: true,
                pass: true,
                ip: true,
            },
            calls: AtomicUsize::new(0),
        }
    }

    fn rejecting() -> FakeLimiter {
        FakeLimiter {
            outcome: CheckAllOutcome {
                allowed: false,
                login: false,
                pass: true,
                ip: true,
            },
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn whitelist_short_circuits_before_any_debit() {
        let lists = ListStore::new();
        lists
            .add(
                crate::list_store::ListKind::Whitelist,
                "198.51.100.7/32".parse().unwrap(),
                false,
            )
            .unwrap();
        let limiter = rejecting();

        let v = verdict(&lists, &limiter, "alice", "pw", "198.51.100.7")
            .await
            .unwrap();

        assert_eq!(v, Verdict::Allow);
        assert_eq!(limiter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blacklist_rejects_without_consulting_rate_limiter() {
        let lists = ListStore::new();
        lists
            .add(
                crate::list_store::ListKind::Blacklist,
                "203.0.113.0/24".parse().unwrap(),
                false,
            )
            .unwrap();
        let limiter = allowing();

        let v = verdict(&lists, &limiter, "alice", "pw", "203.0.113.5")
            .await
            .unwrap();

        assert_eq!(v, Verdict::Reject);
        assert_eq!(limiter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unlisted_ip_defers_to_rate_limiter_allow() {
        let lists = ListStore::new();
        let limiter = allowing();

        let v = verdict(&lists, &limiter, "alice", "pw", "192.0.2.1")
            .await
            .unwrap();

        assert_eq!(v, Verdict::Allow);
        assert_eq!(limiter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlisted_ip_defers_to_rate_limiter_reject() {
        let lists = ListStore::new();
        let limiter = rejecting();

        let v = verdict(&lists, &limiter, "alice", "pw", "192.0.2.1")
            .await
            .unwrap();

        assert_eq!(v, Verdict::Reject);
    }

    #[tokio::test]
    async fn malformed_ip_is_input_invalid_before_any_lookup() {
        let lists = ListStore::new();
        let limiter = allowing();

        let err = verdict(&lists, &limiter, "alice", "pw", "not-an-ip")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InputInvalid(_)));
        assert_eq!(limiter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cidr_notation_is_rejected_for_authorize() {
        let lists = ListStore::new();
        let limiter = allowing();

        let err = verdict(&lists, &limiter, "alice", "pw", "10.0.0.0/8")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InputInvalid(_)));
    }
}
