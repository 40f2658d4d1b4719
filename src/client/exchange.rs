//! Query/answer exchange with fallback on failure

use crate::client::transport::AnswerTransport;
use crate::messages::{ConversationHistory, HistoryEntry, HistoryUpdate, ImageAttribution, Role};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one exchange. Always well-formed, even when the service failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResponse {
    pub answer: String,
    pub history: HistoryUpdate,
    pub image: Option<ImageAttribution>,
}

impl ExchangeResponse {
    /// Whether this response was synthesized locally after a failure
    pub fn is_fallback(&self) -> bool {
        !self.history.is_confirmed()
    }
}

/// Client for the answer service
#[derive(Clone)]
pub struct ConversationClient {
    transport: Arc<dyn AnswerTransport>,
    fallback_apology: String,
}

impl ConversationClient {
    pub fn new(transport: Arc<dyn AnswerTransport>, fallback_apology: impl Into<String>) -> Self {
        Self {
            transport,
            fallback_apology: fallback_apology.into(),
        }
    }

    /// Send `query` and return the service's answer.
    ///
    /// `previous` is only used to build the speculative history of a fallback.
    pub async fn exchange(&self, query: &str, previous: &ConversationHistory) -> ExchangeResponse {
        match self.transport.ask(query).await {
            Ok(payload) => {
                info!(
                    "Exchange confirmed ({} history entries, image: {})",
                    payload.history.len(),
                    payload.image.is_some()
                );
                ExchangeResponse {
                    answer: payload.answer,
                    history: HistoryUpdate::Confirmed(payload.history),
                    image: payload.image,
                }
            }
            Err(e) => {
                warn!("Exchange failed, using fallback answer: {}", e);
                self.fallback(query, previous)
            }
        }
    }

    /// Response used when the service cannot be reached or answers badly
    pub fn fallback(&self, query: &str, previous: &ConversationHistory) -> ExchangeResponse {
        let mut history = previous.clone();
        history.push(HistoryEntry::new(Role::User, query));

        ExchangeResponse {
            answer: self.fallback_apology.clone(),
            history: HistoryUpdate::Speculative(history),
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::AnswerPayload;
    use crate::{ParleyError, Result};
    use async_trait::async_trait;

    struct Canned(std::result::Result<AnswerPayload, ParleyError>);

    #[async_trait]
    impl AnswerTransport for Canned {
        async fn ask(&self, _query: &str) -> Result<AnswerPayload> {
            self.0.clone()
        }
    }

    fn client(reply: std::result::Result<AnswerPayload, ParleyError>) -> ConversationClient {
        ConversationClient::new(Arc::new(Canned(reply)), "sorry")
    }

    #[tokio::test]
    async fn test_success_is_confirmed() {
        let history = vec![
            HistoryEntry::new(Role::User, "q"),
            HistoryEntry::new(Role::Assistant, "a"),
        ];
        let client = client(Ok(AnswerPayload {
            answer: "a".into(),
            history: history.clone(),
            image: None,
        }));

        let response = client.exchange("q", &Vec::new()).await;
        assert_eq!(response.answer, "a");
        assert_eq!(response.history, HistoryUpdate::Confirmed(history));
        assert!(!response.is_fallback());
    }

    #[tokio::test]
    async fn test_failure_builds_speculative_history() {
        let previous = vec![HistoryEntry::new(Role::Assistant, "greeting")];
        let client = client(Err(ParleyError::Transport("connection refused".into())));

        let response = client.exchange("q", &previous).await;
        assert!(response.is_fallback());
        assert_eq!(response.answer, "sorry");
        assert!(response.image.is_none());
        assert_eq!(
            response.history,
            HistoryUpdate::Speculative(vec![
                HistoryEntry::new(Role::Assistant, "greeting"),
                HistoryEntry::new(Role::User, "q"),
            ])
        );
    }
}
