//! Client for the remote assistant endpoint.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::error::{Error, Result};

/// Body of an outbound chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Stable caller identity token.
    pub user_id: String,

    /// Composed message text.
    pub message: String,
}

/// Body of the endpoint's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    /// Assistant reply; absent or empty means the server failed to answer.
    #[serde(default)]
    pub reply: Option<String>,
}

impl ChatReply {
    /// The reply text, if the server produced a non-empty one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.reply.as_deref().filter(|r| !r.is_empty())
    }
}

/// A remote service that answers chat requests.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send one request and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the service is unreachable, answers with a
    /// non-success status, or answers with a body that is not a `ChatReply`.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// HTTP implementation of `ChatEndpoint`: `POST` with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: ReqwestClient,
    url: String,
    timeout: Duration,
}

impl HttpEndpoint {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout,
        })
    }

    /// URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(&self, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl ChatEndpoint for HttpEndpoint {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        tracing::debug!(url = %self.url, bytes = request.message.len(), "posting chat request");

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(&e))?;
        serde_json::from_str::<ChatReply>(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}
