//! HTTP plumbing shared by both remote clients.
//!
//! [`JsonTransport`] is the seam: the API clients only ever build URLs and
//! JSON bodies and hand them to a transport. [`HttpTransport`] is the real
//! implementation on top of `reqwest`; it owns the credentials and the fixed
//! per-request deadline for one remote system.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::ApiError;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal JSON-over-HTTP surface the API clients need.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// GET a JSON document.
    async fn get_json(&self, url: &str) -> Result<Value, ApiError>;

    /// GET raw bytes. A 404 is reported as `Ok(None)`, not as an error.
    async fn get_raw(&self, url: &str) -> Result<Option<Vec<u8>>, ApiError>;

    /// POST a JSON body and decode the JSON answer.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError>;

    /// PUT a JSON body and decode the JSON answer.
    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, ApiError>;
}

/// How requests authenticate against the remote.
#[derive(Clone)]
pub enum Credentials {
    /// HTTP basic auth (user name + app password).
    Basic { user: String, password: String },
    /// `Authorization: Token <id>:<secret>`.
    Token { id: String, secret: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { user, .. } => write!(f, "Basic({user}:***)"),
            Credentials::Token { id, .. } => write!(f, "Token({id}:***)"),
        }
    }
}

/// `reqwest`-backed [`JsonTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                url: String::from("<client builder>"),
                source: e,
            })?;
        info!(?credentials, timeout_secs = timeout.as_secs(), "Initialised HTTP transport");
        Ok(Self {
            client,
            credentials,
        })
    }

    fn authorise(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header(reqwest::header::ACCEPT, "application/json");
        match &self.credentials {
            Credentials::Basic { user, password } => req.basic_auth(user, Some(password)),
            Credentials::Token { id, secret } => {
                req.header(reqwest::header::AUTHORIZATION, format!("Token {id}:{secret}"))
            }
        }
    }

    async fn send(&self, url: &str, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        self.authorise(req).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Request failed before a response arrived");
            ApiError::Transport {
                url: url.to_string(),
                source: e,
            }
        })
    }

    async fn json_body(url: &str, resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        if !status.is_success() {
            error!(status = %status, url = %url, "Remote returned error. Response body: {text}");
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, url = %url, "Failed to parse JSON response");
            ApiError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl JsonTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        debug!(url = %url, "GET (json)");
        let resp = self.send(url, self.client.get(url)).await?;
        Self::json_body(url, resp).await
    }

    async fn get_raw(&self, url: &str) -> Result<Option<Vec<u8>>, ApiError> {
        debug!(url = %url, "GET (raw)");
        let resp = self.send(url, self.client.get(url)).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            info!(url = %url, "Received 404, resource not present");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, url = %url, "Remote returned error for raw fetch");
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        debug!(url = %url, "POST");
        let resp = self.send(url, self.client.post(url).json(body)).await?;
        Self::json_body(url, resp).await
    }

    async fn put_json(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        debug!(url = %url, "PUT");
        let resp = self.send(url, self.client.put(url).json(body)).await?;
        Self::json_body(url, resp).await
    }
}
