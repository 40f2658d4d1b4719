use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model", alias = "assistant")]
    Assistant,
}

/// Credit for an illustrative photo attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttribution {
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "photographer", alias = "photographerName")]
    pub photographer_name: String,
    #[serde(
        rename = "profile_url",
        alias = "profileUrl",
        alias = "photographerProfileUrl"
    )]
    pub photographer_profile_url: String,
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    id: Uuid,
    role: Role,
    text: String,
    image: Option<ImageAttribution>,
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), None)
    }

    pub fn assistant(text: impl Into<String>, image: Option<ImageAttribution>) -> Self {
        Self::new(Role::Assistant, text.into(), image)
    }

    fn new(role: Role, text: String, image: Option<ImageAttribution>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            image,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribution for the attached photo. Only assistant turns carry one.
    pub fn image(&self) -> Option<&ImageAttribution> {
        match self.role {
            Role::Assistant => self.image.as_ref(),
            Role::User => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// History entry as exchanged with the answer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub parts: String,
}

impl HistoryEntry {
    pub fn new(role: Role, parts: impl Into<String>) -> Self {
        Self {
            role,
            parts: parts.into(),
        }
    }
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self::new(turn.role(), turn.text())
    }
}

pub type ConversationHistory = Vec<HistoryEntry>;

/// History produced by an exchange.
///
/// `Confirmed` is the service's authoritative copy. `Speculative` is rebuilt
/// locally after a failed exchange and is overwritten by the next confirmed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryUpdate {
    Confirmed(ConversationHistory),
    Speculative(ConversationHistory),
}

impl HistoryUpdate {
    pub fn history(&self) -> &ConversationHistory {
        match self {
            HistoryUpdate::Confirmed(h) | HistoryUpdate::Speculative(h) => h,
        }
    }

    pub fn into_history(self) -> ConversationHistory {
        match self {
            HistoryUpdate::Confirmed(h) | HistoryUpdate::Speculative(h) => h,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, HistoryUpdate::Confirmed(_))
    }
}
