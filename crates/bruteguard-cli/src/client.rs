use bruteguard_types::{ListAddRequest, ListDelRequest, OkResponse, ViewListsResponse};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    ServerError { status: u16, body: String },
}

pub struct AdminClient {
    http: Client,
    base_url: String,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_ok(&self, path: &str, body: impl serde::Serialize) -> Result<OkResponse, ApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "POST");
        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    pub async fn reset_all(&self) -> Result<OkResponse, ApiError> {
        self.post_ok("/api/bucket/reset", serde_json::json!({})).await
    }

    pub async fn whitelist_add(&self, ip: &str, force: bool) -> Result<OkResponse, ApiError> {
        self.post_ok(
            "/api/whitelist/add",
            ListAddRequest {
                ip: ip.to_string(),
                force,
            },
        )
        .await
    }

    pub async fn whitelist_del(&self, ip: &str) -> Result<OkResponse, ApiError> {
        self.post_ok(
            "/api/whitelist/del",
            ListDelRequest { ip: ip.to_string() },
        )
        .await
    }

    pub async fn blacklist_add(&self, ip: &str, force: bool) -> Result<OkResponse, ApiError> {
        self.post_ok(
            "/api/blacklist/add",
            ListAddRequest {
                ip: ip.to_string(),
                force,
            },
        )
        .await
    }

    pub async fn blacklist_del(&self, ip: &str) -> Result<OkResponse, ApiError> {
        self.post_ok(
            "/api/blacklist/del",
            ListDelRequest { ip: ip.to_string() },
        )
        .await
    }

    pub async fn view_lists(&self) -> Result<ViewListsResponse, ApiError> {
        let url = format!("{}/api/view/lists", self.base_url);
        debug!(url = %url, "GET");
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}
