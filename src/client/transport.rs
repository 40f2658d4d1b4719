//! Wire transport to the answer service

use crate::messages::{ConversationHistory, ImageAttribution};
use crate::{ParleyError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body: the query alone, the service tracks history itself
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

/// Successful response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerPayload {
    pub answer: String,
    pub history: ConversationHistory,
    #[serde(default)]
    pub image: Option<ImageAttribution>,
}

impl AnswerPayload {
    /// Parse and check a response body
    pub fn from_json(body: &str) -> Result<Self> {
        let payload: AnswerPayload = serde_json::from_str(body)?;
        if payload.answer.trim().is_empty() {
            return Err(ParleyError::Protocol("response has an empty answer".to_string()));
        }
        Ok(payload)
    }
}

/// Something that can carry a query to the answer service
#[async_trait]
pub trait AnswerTransport: Send + Sync {
    async fn ask(&self, query: &str) -> Result<AnswerPayload>;
}

/// JSON-over-HTTP transport
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AnswerTransport for HttpTransport {
    async fn ask(&self, query: &str) -> Result<AnswerPayload> {
        debug!("POST {} ({} chars)", self.endpoint, query.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParleyError::Protocol(format!("HTTP error status: {}", status)));
        }

        let body = response.text().await?;
        AnswerPayload::from_json(&body)
    }
}
