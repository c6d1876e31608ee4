//! Token-bucket rate limiting: a Redis-backed store (Component C) and the
//! limiter built on top of it (Component D).

pub mod limiter;
pub mod store;

pub use limiter::{AllowOutcome, CheckAllOutcome, RateLimiter, RateLimiterError};
pub use store::{BucketStore, BucketStoreError};
