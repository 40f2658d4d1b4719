//! Answer service client
//!
//! One query goes out, one well-formed response always comes back.

pub mod exchange;
pub mod pipeline;
pub mod transport;

pub use exchange::{ConversationClient, ExchangeResponse};
pub use pipeline::{ExchangeCommand, ExchangeEvent, ExchangePipeline};
pub use transport::{AnswerPayload, AnswerTransport, HttpTransport, QueryRequest};
