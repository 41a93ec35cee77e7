use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadState {
    Unread,
    Read,
}

/// A single message, owned by exactly one conversation through that
/// conversation's message-id sequence. Text and media are mutually
/// exclusive: a text message carries `content`, a media message carries the
/// blob-store path in `media`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    #[serde(rename = "message_type")]
    pub kind: MessageKind,
    pub media: String,
    pub status: ReadState,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Message {
    pub fn text(content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content,
            kind: MessageKind::Text,
            media: String::new(),
            status: ReadState::Unread,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn media(path: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content: String::new(),
            kind: MessageKind::Media,
            media: path,
            status: ReadState::Unread,
            created_at: now,
            modified_at: now,
        }
    }
}

/// The ordered message history for one ordered (sender, receiver) pair.
/// Direction matters: (A,B) and (B,A) are distinct records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub messages: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(sender_id: Uuid, receiver_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            sender_id,
            receiver_id,
            messages: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }
}
