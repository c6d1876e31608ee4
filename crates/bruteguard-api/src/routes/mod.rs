//! HTTP handlers for the admin surface (Component F): one handler per
//! operation in the wire contract, each a thin dispatcher onto the list
//! store or rate limiter.

mod admin;

pub use admin::configure;
