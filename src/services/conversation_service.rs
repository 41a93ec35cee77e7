//! Message persistence, per-direction threads, and read-state transitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blobs::BlobStore;
use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageKind, ReadState, User};
use crate::store::Store;

/// An outbound message request: text content XOR a raw media payload,
/// addressed to a receiver by email.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub receiver: String,
    #[serde(rename = "message_type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<u8>>,
}

/// Whether the viewer sent or received a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// A message annotated with its direction relative to the thread viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadMessage {
    #[serde(flatten)]
    pub message: Message,
    #[serde(rename = "type")]
    pub direction: Direction,
}

pub struct ConversationService;

impl ConversationService {
    /// Validate, persist and file a new message.
    ///
    /// The message save and the conversation append are two sequential,
    /// independently committed writes; no transaction spans them.
    pub async fn send_message(
        store: &Store,
        blobs: &dyn BlobStore,
        sender_id: Uuid,
        request: SendMessage,
    ) -> AppResult<Message> {
        let receiver = store
            .find_user_by_email(&request.receiver)
            .await
            .ok_or_else(|| {
                AppError::Validation("You can't send a message to a non existing user!".into())
            })?;
        if receiver.id == sender_id {
            return Err(AppError::Validation(
                "You can't send a message to yourself!".into(),
            ));
        }

        let message = match request.kind {
            MessageKind::Media => {
                let payload = request.media.unwrap_or_default();
                if payload.is_empty() {
                    return Err(AppError::Validation(
                        "You can't upload an empty file!".into(),
                    ));
                }
                let path = format!("chat/media/user/{}/{}.png", sender_id, Uuid::new_v4());
                blobs.put(&path, payload).await?;
                Message::media(path)
            }
            MessageKind::Text => {
                if request.content.trim().is_empty() {
                    return Err(AppError::Validation(
                        "You can't send an empty message!".into(),
                    ));
                }
                Message::text(request.content)
            }
        };

        store.insert_message(message.clone()).await;
        store
            .append_to_conversation(sender_id, receiver.id, message.id)
            .await;
        tracing::debug!(sender = %sender_id, receiver = %receiver.id, message = %message.id,
            "message delivered");
        Ok(message)
    }

    /// Both directions of the viewer's thread with the counterpart, merged
    /// and ordered by creation time ascending. Viewing flips every unread
    /// received message to read; there is no separate mark-read call, and
    /// the flip is idempotent.
    pub async fn fetch_thread(
        store: &Store,
        viewer_id: Uuid,
        counterpart_email: &str,
    ) -> AppResult<Vec<ThreadMessage>> {
        let counterpart = store
            .find_user_by_email(counterpart_email)
            .await
            .ok_or_else(|| {
                AppError::Validation("You can't fetch messages of a non existing user!".into())
            })?;

        let mut thread: Vec<ThreadMessage> = Vec::new();
        for message in store.conversation_messages(viewer_id, counterpart.id).await {
            thread.push(ThreadMessage {
                message,
                direction: Direction::Sent,
            });
        }
        for mut message in store.conversation_messages(counterpart.id, viewer_id).await {
            if message.status == ReadState::Unread {
                store.mark_read(message.id).await;
                message.status = ReadState::Read;
            }
            thread.push(ThreadMessage {
                message,
                direction: Direction::Received,
            });
        }
        thread.sort_by_key(|tm| tm.message.created_at);
        Ok(thread)
    }

    /// Everyone the viewer has a conversation with, in either direction,
    /// deduplicated and ordered by display name.
    pub async fn list_correspondents(store: &Store, viewer_id: Uuid) -> AppResult<Vec<User>> {
        let mut ids: Vec<Uuid> = store
            .conversations_from(viewer_id)
            .await
            .into_iter()
            .map(|c| c.receiver_id)
            .collect();
        for conversation in store.conversations_to(viewer_id).await {
            if !ids.contains(&conversation.sender_id) {
                ids.push(conversation.sender_id);
            }
        }
        let mut users = store.find_users_by_ids(&ids).await;
        users.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
        });
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blobs::MemoryBlobStore;
    use std::sync::Arc;

    fn user(first_name: &str, email: &str) -> User {
        User::new(
            first_name.into(),
            "Tester".into(),
            "1990-01-01".into(),
            "man".into(),
            "woman".into(),
            1,
            "music".into(),
            email.into(),
            "hash".into(),
            String::new(),
        )
    }

    fn text(receiver: &str, content: &str) -> SendMessage {
        SendMessage {
            receiver: receiver.into(),
            kind: MessageKind::Text,
            content: content.into(),
            media: None,
        }
    }

    async fn seeded() -> (Arc<Store>, MemoryBlobStore, User, User) {
        let store = Arc::new(Store::new());
        let alice = user("Alice", "alice@tryst.app");
        let bob = user("Bob", "bob@tryst.app");
        store.insert_user(alice.clone()).await;
        store.insert_user(bob.clone()).await;
        (store, MemoryBlobStore::new(), alice, bob)
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let (store, blobs, alice, _) = seeded().await;
        let result =
            ConversationService::send_message(&store, &blobs, alice.id, text("bob@tryst.app", ""))
                .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn self_send_is_rejected() {
        let (store, blobs, alice, _) = seeded().await;
        let result = ConversationService::send_message(
            &store,
            &blobs,
            alice.id,
            text("alice@tryst.app", "hi me"),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_receiver_is_rejected() {
        let (store, blobs, alice, _) = seeded().await;
        let result = ConversationService::send_message(
            &store,
            &blobs,
            alice.id,
            text("ghost@tryst.app", "hello?"),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn fetch_flips_received_to_read_idempotently() {
        let (store, blobs, alice, bob) = seeded().await;
        ConversationService::send_message(&store, &blobs, alice.id, text("bob@tryst.app", "hi"))
            .await
            .unwrap();

        let thread = ConversationService::fetch_thread(&store, bob.id, "alice@tryst.app")
            .await
            .unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].direction, Direction::Received);
        assert_eq!(thread[0].message.status, ReadState::Read);

        // Second fetch: still read, still one message.
        let again = ConversationService::fetch_thread(&store, bob.id, "alice@tryst.app")
            .await
            .unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].message.status, ReadState::Read);

        // The sender's own view never mutates read state and tags `sent`.
        let alices = ConversationService::fetch_thread(&store, alice.id, "bob@tryst.app")
            .await
            .unwrap();
        assert_eq!(alices[0].direction, Direction::Sent);
    }

    #[tokio::test]
    async fn thread_is_ordered_by_creation_time() {
        let (store, blobs, alice, bob) = seeded().await;
        ConversationService::send_message(&store, &blobs, alice.id, text("bob@tryst.app", "one"))
            .await
            .unwrap();
        ConversationService::send_message(&store, &blobs, bob.id, text("alice@tryst.app", "two"))
            .await
            .unwrap();
        ConversationService::send_message(&store, &blobs, alice.id, text("bob@tryst.app", "three"))
            .await
            .unwrap();

        let thread = ConversationService::fetch_thread(&store, bob.id, "alice@tryst.app")
            .await
            .unwrap();
        let contents: Vec<&str> = thread.iter().map(|t| t.message.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn media_message_stores_blob_and_path() {
        let (store, blobs, alice, _) = seeded().await;
        let message = ConversationService::send_message(
            &store,
            &blobs,
            alice.id,
            SendMessage {
                receiver: "bob@tryst.app".into(),
                kind: MessageKind::Media,
                content: String::new(),
                media: Some(vec![0x89, 0x50, 0x4e, 0x47]),
            },
        )
        .await
        .unwrap();

        assert_eq!(message.kind, MessageKind::Media);
        assert!(message.media.starts_with(&format!("chat/media/user/{}/", alice.id)));
        assert_eq!(
            blobs.get(&message.media).await.unwrap(),
            vec![0x89, 0x50, 0x4e, 0x47]
        );
    }

    #[tokio::test]
    async fn empty_media_payload_is_rejected_and_not_persisted() {
        let (store, blobs, alice, bob) = seeded().await;
        let result = ConversationService::send_message(
            &store,
            &blobs,
            alice.id,
            SendMessage {
                receiver: "bob@tryst.app".into(),
                kind: MessageKind::Media,
                content: String::new(),
                media: Some(Vec::new()),
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(ConversationService::fetch_thread(&store, bob.id, "alice@tryst.app")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn correspondents_are_deduplicated_and_ordered_by_name() {
        let (store, blobs, alice, bob) = seeded().await;
        let carol = user("Carol", "carol@tryst.app");
        store.insert_user(carol.clone()).await;

        // Alice <-> Bob both directions; Carol -> Alice only.
        ConversationService::send_message(&store, &blobs, alice.id, text("bob@tryst.app", "hi"))
            .await
            .unwrap();
        ConversationService::send_message(&store, &blobs, bob.id, text("alice@tryst.app", "yo"))
            .await
            .unwrap();
        ConversationService::send_message(&store, &blobs, carol.id, text("alice@tryst.app", "hey"))
            .await
            .unwrap();

        let correspondents = ConversationService::list_correspondents(&store, alice.id)
            .await
            .unwrap();
        let names: Vec<&str> = correspondents
            .iter()
            .map(|u| u.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Carol"]);
    }
}
