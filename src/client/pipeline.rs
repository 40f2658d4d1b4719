//! Exchange pipeline for running network round trips off the controller thread
//!
//! Provides a channel-based interface: the controller sends an
//! [`ExchangeCommand`] and later receives exactly one [`ExchangeEvent::Settled`]
//! for it.

use crate::client::exchange::{ConversationClient, ExchangeResponse};
use crate::messages::ConversationHistory;
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Commands that can be sent to the exchange pipeline
#[derive(Debug, Clone)]
pub enum ExchangeCommand {
    /// Send a query to the answer service
    Exchange {
        /// The user's query
        query: String,
        /// Local history, used only for a fallback response
        history: ConversationHistory,
        /// Unique request ID for tracking
        request_id: Uuid,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the exchange pipeline
#[derive(Debug, Clone)]
pub enum ExchangeEvent {
    /// The round trip finished, successfully or with a fallback
    Settled {
        /// Request ID this response answers
        request_id: Uuid,
        /// The response
        response: ExchangeResponse,
    },

    /// Pipeline has shut down
    Shutdown,
}

/// Exchange pipeline with channel-based communication
pub struct ExchangePipeline {
    client: ConversationClient,
    command_tx: Sender<ExchangeCommand>,
    command_rx: Receiver<ExchangeCommand>,
    event_tx: Sender<ExchangeEvent>,
    event_rx: Receiver<ExchangeEvent>,
}

impl ExchangePipeline {
    /// Create a new exchange pipeline
    pub fn new(client: ConversationClient) -> Self {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = bounded(16);

        Self {
            client,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<ExchangeCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<ExchangeEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let client = self.client;
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;

        let handle = thread::Builder::new()
            .name("parley-exchange".to_string())
            .spawn(move || {
                info!("Exchange pipeline worker starting");

                // Without a runtime every exchange settles with the fallback
                let runtime = match Runtime::new() {
                    Ok(rt) => Some(rt),
                    Err(e) => {
                        error!("Failed to create tokio runtime: {}", e);
                        None
                    }
                };

                loop {
                    match command_rx.recv() {
                        Ok(ExchangeCommand::Exchange {
                            query,
                            history,
                            request_id,
                        }) => {
                            debug!("Processing exchange request: {}", request_id);

                            let response = match &runtime {
                                Some(rt) => rt.block_on(client.exchange(&query, &history)),
                                None => client.fallback(&query, &history),
                            };

                            if event_tx
                                .send(ExchangeEvent::Settled {
                                    request_id,
                                    response,
                                })
                                .is_err()
                            {
                                info!("Exchange event receiver dropped");
                                break;
                            }
                        }
                        Ok(ExchangeCommand::Shutdown) => {
                            info!("Exchange pipeline worker shutting down");
                            let _ = event_tx.send(ExchangeEvent::Shutdown);
                            break;
                        }
                        Err(_) => {
                            info!("Exchange command channel closed");
                            break;
                        }
                    }
                }
            })?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{AnswerPayload, AnswerTransport};
    use crate::messages::{HistoryEntry, Role};
    use crate::ParleyError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct Unreachable;

    #[async_trait]
    impl AnswerTransport for Unreachable {
        async fn ask(&self, _query: &str) -> Result<AnswerPayload> {
            Err(ParleyError::Transport("unreachable".into()))
        }
    }

    #[test]
    fn test_settles_with_request_id() {
        let client = ConversationClient::new(Arc::new(Unreachable), "sorry");
        let pipeline = ExchangePipeline::new(client);
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        let handle = pipeline.start_worker().unwrap();

        let request_id = Uuid::new_v4();
        tx.send(ExchangeCommand::Exchange {
            query: "q".into(),
            history: vec![HistoryEntry::new(Role::Assistant, "hi")],
            request_id,
        })
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ExchangeEvent::Settled {
                request_id: settled,
                response,
            } => {
                assert_eq!(settled, request_id);
                assert_eq!(response.answer, "sorry");
                assert_eq!(response.history.history().len(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        tx.send(ExchangeCommand::Shutdown).unwrap();
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            ExchangeEvent::Shutdown
        ));
        handle.join().unwrap();
    }
}
