//! Remote favorites: the authenticated REST endpoint.
//!
//! The backend owns the account's favorites set; this module only
//! appends to, removes from, and reads it. Every response uses the
//! `{ "success": bool, "data"?, "message"? }` envelope.

use crate::config::Config;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use clip_engine::FavoriteId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The server-side favorites set, as the client sees it.
#[async_trait]
pub trait RemoteFavorites: Send + Sync {
    /// Fetch the full favorites set for the signed-in account.
    async fn fetch(&self) -> Result<Vec<FavoriteId>>;

    /// Add one favorite. Assumed idempotent server-side: re-adding an
    /// already-favorited id succeeds.
    async fn add(&self, id: &str) -> Result<()>;

    /// Remove one favorite. Removing an absent id is a no-op.
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Request body for adding a favorite.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddFavoriteRequest<'a> {
    coupon_id: &'a str,
}

/// `reqwest`-backed implementation of [`RemoteFavorites`].
#[derive(Debug, Clone)]
pub struct HttpFavorites {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpFavorites {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_client(
            http,
            &config.api_base_url,
            config.api_token.clone(),
        ))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http,
            base_url,
            token,
        }
    }

    fn favorites_url(&self) -> String {
        format!("{}/favorites", self.base_url)
    }

    fn favorite_url(&self, id: &str) -> String {
        format!("{}/favorites/{}", self.base_url, id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check status and envelope, returning the payload on success.
    async fn unwrap_envelope(response: reqwest::Response) -> Result<Option<Value>> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = response.json().await?;
        if !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request not successful".to_string()),
            });
        }

        Ok(envelope.data)
    }

    /// Extract ids from the `data` payload, which is either an array of
    /// id strings/integers or an array of coupon objects with an `id`.
    fn ids_from_data(data: Option<Value>) -> Result<Vec<FavoriteId>> {
        let Some(data) = data else {
            return Ok(Vec::new());
        };

        let entries = data.as_array().ok_or_else(|| ClientError::Api {
            status: 200,
            message: format!("expected an array of favorites, got {data}"),
        })?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = match entry {
                Value::String(id) => Some(id.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Object(fields) => fields.get("id").map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
                _ => None,
            };
            match id {
                Some(id) => ids.push(id),
                None => {
                    return Err(ClientError::Api {
                        status: 200,
                        message: format!("unrecognized favorites entry: {entry}"),
                    })
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl RemoteFavorites for HttpFavorites {
    async fn fetch(&self) -> Result<Vec<FavoriteId>> {
        tracing::debug!(url = %self.favorites_url(), "fetching remote favorites");
        let response = self
            .authorize(self.http.get(self.favorites_url()))
            .send()
            .await?;
        let data = Self::unwrap_envelope(response).await?;
        Self::ids_from_data(data)
    }

    async fn add(&self, id: &str) -> Result<()> {
        tracing::debug!(coupon_id = %id, "adding remote favorite");
        let response = self
            .authorize(self.http.post(self.favorites_url()))
            .json(&AddFavoriteRequest { coupon_id: id })
            .send()
            .await?;
        Self::unwrap_envelope(response).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        tracing::debug!(coupon_id = %id, "removing remote favorite");
        let response = self
            .authorize(self.http.delete(self.favorite_url(id)))
            .send()
            .await?;

        // Removing an id the server never had is a no-op, not an error.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::unwrap_envelope(response).await?;
        Ok(())
    }
}
