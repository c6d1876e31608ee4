//! bruteguard-types: Wire types shared between the bruteguard gate service
//! and its admin CLI.
//!
//! These are the JSON request/response bodies defined by the admin surface
//! contract. They carry no behavior of their own — validation and decisions
//! live in `bruteguard-api`.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// Body of `POST /api/authorize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// Account identifier the caller is attempting to authenticate as.
    pub login: String,
    /// Plaintext password. Never logged or persisted — only its SHA-256
    /// fingerprint is used downstream.
    pub password: String,
    /// Source IPv4 address of the attempt, as a dotted-quad string.
    pub ip: String,
}

/// Body of `POST /api/bucket/reset/ip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetIpRequest {
    /// IPv4 address whose bucket should be reset.
    pub ip: String,
}

/// Body of `POST /api/bucket/reset/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetLoginRequest {
    /// Login whose bucket should be reset.
    pub login: String,
}

/// Body of `POST /api/whitelist/add` and `POST /api/blacklist/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAddRequest {
    /// Bare IPv4 address (promoted to `/32`) or CIDR notation.
    pub ip: String,
    /// When true, bypass the cross-list overlap check.
    #[serde(default)]
    pub force: bool,
}

/// Body of `POST /api/whitelist/del` and `POST /api/blacklist/del`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDelRequest {
    /// Canonical CIDR text of the entry to remove.
    pub ip: String,
}

/// Generic envelope returned by every admin endpoint except `view/lists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable explanation when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OkResponse {
    /// Build a success envelope with no reason.
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    /// Build a failure envelope carrying the given reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Response body of `GET /api/view/lists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewListsResponse {
    /// Always true; enumeration cannot itself fail.
    pub ok: bool,
    /// Canonical CIDR text of every whitelist entry.
    pub whitelist: Vec<String>,
    /// Canonical CIDR text of every blacklist entry.
    pub blacklist: Vec<String>,
}
