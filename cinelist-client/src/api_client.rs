//! REST client for the item endpoints.

use crate::config::{AuthConfig, ClientConfig};
use async_trait::async_trait;
use cinelist_api::{ApiError as ApiServerError, ErrorCode, SelectAck, SESSION_TOKEN_HEADER};
use cinelist_core::{Item, ItemSnapshot};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A structured error body from the server. Displays as the bare
    /// message so it can be shown inline.
    #[error("{message}")]
    Server {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Item operations the list controller depends on.
#[async_trait]
pub trait ItemsApi: Send + Sync {
    /// Items and stats in one read.
    async fn snapshot(&self) -> Result<ItemSnapshot, ApiClientError>;

    /// Add an item. `label` is sent as entered; the server normalizes it.
    async fn add_item(&self, label: &str) -> Result<Item, ApiClientError>;

    async fn edit_item(&self, id: &str, label: &str) -> Result<Item, ApiClientError>;

    async fn select_item(&self, item: &Item) -> Result<SelectAck, ApiClientError>;
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

#[derive(Serialize)]
struct EditBody<'a> {
    label: &'a str,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let text = response.text().await?;
        if let Ok(api_error) = serde_json::from_str::<ApiServerError>(&text) {
            return Err(ApiClientError::Server {
                status: status.as_u16(),
                code: api_error.code,
                message: api_error.message,
            });
        }
        Err(ApiClientError::InvalidResponse(format!(
            "HTTP {}: {}",
            status.as_u16(),
            text
        )))
    }
}

#[async_trait]
impl ItemsApi for RestClient {
    async fn snapshot(&self) -> Result<ItemSnapshot, ApiClientError> {
        let response = self
            .client
            .get(self.url("/api/v1/items/snapshot"))
            .headers(self.auth_header.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn add_item(&self, label: &str) -> Result<Item, ApiClientError> {
        let response = self
            .client
            .post(self.url("/api/v1/items"))
            .headers(self.auth_header.clone())
            .form(&[("label", label)])
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn edit_item(&self, id: &str, label: &str) -> Result<Item, ApiClientError> {
        let path = format!("/api/v1/items/{}", id);
        let response = self
            .client
            .put(self.url(&path))
            .headers(self.auth_header.clone())
            .json(&EditBody { label })
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn select_item(&self, item: &Item) -> Result<SelectAck, ApiClientError> {
        let response = self
            .client
            .post(self.url("/api/v1/items/select"))
            .headers(self.auth_header.clone())
            .json(item)
            .send()
            .await?;
        self.parse_response(response).await
    }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(token) = &auth.session_token {
        headers.insert(
            HeaderName::from_static(SESSION_TOKEN_HEADER),
            HeaderValue::from_str(token).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
