//! Realtime frame vocabulary.
//!
//! Inbound and outbound frames are UTF-8 JSON objects with a `type`
//! discriminator. Clients send `text`, `media` (base64 payload in
//! `content`) and `leave`; any other tag is treated as `text`. The server
//! emits `text`, `media` (payload rewritten to a storage path), `online`
//! and `offline`.

use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Inbound frames from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatFrame {
    Text {
        content: String,
    },
    Media {
        /// Base64-encoded raw payload.
        content: String,
    },
    Leave {
        #[serde(default)]
        content: Option<String>,
    },
}

impl ChatFrame {
    /// Decode an inbound frame. Only `media` and `leave` are dispatched by
    /// tag; every other tag falls through to the text branch with whatever
    /// `content` the frame carries, so new client frame types degrade to
    /// plain messages instead of faults. Malformed JSON (and a `media`
    /// frame without its payload) is an error.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        match value.get("type").and_then(|t| t.as_str()) {
            Some("media") | Some("leave") => serde_json::from_value(value),
            _ => Ok(ChatFrame::Text {
                content: value
                    .get("content")
                    .and_then(|c| c.as_str())
                    .unwrap_or_default()
                    .to_string(),
            }),
        }
    }
}

/// Outbound frames from server to the conversation pair. Every frame is
/// stamped with the originating user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    Online { user: Profile, content: String },
    Offline { user: Profile, content: String },
    Text { user: Profile, content: String },
    Media { user: Profile, media: String },
}

impl ServerEvent {
    pub fn online(user: Profile) -> Self {
        let content = format!("{} is online!", user.first_name);
        ServerEvent::Online { user, content }
    }

    pub fn offline(user: Profile) -> Self {
        let content = format!("{} went offline!", user.first_name);
        ServerEvent::Offline { user, content }
    }

    pub fn to_json(&self) -> String {
        // The enum serializes infallibly; fall back to an empty object to
        // keep the channel free of raw error text.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
