//! Process-local document store.
//!
//! Three logical collections (users, token sets + match lists, conversations
//! + messages), each addressed by an opaque id and exposing
//! find-one/find-many/insert-or-replace semantics. Per-identity list
//! mutations (token append/remove, match append, conversation append) are
//! single operations under the collection's write lock, so concurrent
//! requests for the same identity cannot lose appends.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, MatchList, Message, ReadState, TokenSet, User};

#[derive(Default)]
pub struct Store {
    users: RwLock<HashMap<Uuid, User>>,
    token_sets: RwLock<HashMap<Uuid, TokenSet>>,
    match_lists: RwLock<HashMap<Uuid, MatchList>>,
    conversations: RwLock<HashMap<(Uuid, Uuid), Conversation>>,
    messages: RwLock<HashMap<Uuid, Message>>,
}

/// Result of an atomic check-and-append on a match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAppend {
    Appended,
    AlreadyPresent,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- users ----

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn all_users_except(&self, excluded: Uuid) -> Vec<User> {
        self.users
            .read()
            .await
            .values()
            .filter(|u| u.id != excluded)
            .cloned()
            .collect()
    }

    pub async fn find_users_by_ids(&self, ids: &[Uuid]) -> Vec<User> {
        let users = self.users.read().await;
        ids.iter().filter_map(|id| users.get(id).cloned()).collect()
    }

    /// Mutate a user record in place under the write lock.
    pub async fn update_user<F>(&self, id: Uuid, mutate: F) -> AppResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found!".into()))?;
        mutate(user);
        user.modified_at = Utc::now();
        Ok(user.clone())
    }

    // ---- token sets ----

    /// Append a token to the identity's set, creating the set lazily.
    /// When the set would exceed `cap`, the oldest token is evicted.
    pub async fn append_token(&self, user_id: Uuid, token: String, cap: usize) {
        let mut sets = self.token_sets.write().await;
        let set = sets.entry(user_id).or_insert_with(|| TokenSet::new(user_id));
        set.tokens.push(token);
        while set.tokens.len() > cap {
            set.tokens.remove(0);
        }
        set.modified_at = Utc::now();
    }

    /// Remove a token from the identity's set. Absent is a no-op; the set
    /// record itself stays even when emptied.
    pub async fn remove_token(&self, user_id: Uuid, token: &str) {
        let mut sets = self.token_sets.write().await;
        if let Some(set) = sets.get_mut(&user_id) {
            if let Some(pos) = set.tokens.iter().position(|t| t == token) {
                set.tokens.remove(pos);
                set.modified_at = Utc::now();
            }
        }
    }

    pub async fn token_present(&self, user_id: Uuid, token: &str) -> bool {
        self.token_sets
            .read()
            .await
            .get(&user_id)
            .map(|set| set.contains(token))
            .unwrap_or(false)
    }

    pub async fn token_count(&self, user_id: Uuid) -> usize {
        self.token_sets
            .read()
            .await
            .get(&user_id)
            .map(|set| set.tokens.len())
            .unwrap_or(0)
    }

    // ---- match lists ----

    /// Atomic check-and-append of a candidate to the owner's list.
    pub async fn add_match(&self, owner: Uuid, candidate: Uuid) -> ListAppend {
        let mut lists = self.match_lists.write().await;
        let list = lists.entry(owner).or_insert_with(|| MatchList::new(owner));
        if list.contains(candidate) {
            return ListAppend::AlreadyPresent;
        }
        list.matches.push(candidate);
        list.modified_at = Utc::now();
        ListAppend::Appended
    }

    pub async fn matches_of(&self, owner: Uuid) -> Vec<Uuid> {
        self.match_lists
            .read()
            .await
            .get(&owner)
            .map(|list| list.matches.clone())
            .unwrap_or_default()
    }

    /// Derived relation: A's list contains B and B's list contains A.
    pub async fn is_mutual(&self, a: Uuid, b: Uuid) -> bool {
        let lists = self.match_lists.read().await;
        let a_has_b = lists.get(&a).map(|l| l.contains(b)).unwrap_or(false);
        let b_has_a = lists.get(&b).map(|l| l.contains(a)).unwrap_or(false);
        a_has_b && b_has_a
    }

    // ---- messages & conversations ----

    pub async fn insert_message(&self, message: Message) {
        self.messages.write().await.insert(message.id, message);
    }

    /// Append a message id to the (sender, receiver) conversation,
    /// creating the record on first contact and bumping `modified_at`.
    pub async fn append_to_conversation(&self, sender: Uuid, receiver: Uuid, message_id: Uuid) {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .entry((sender, receiver))
            .or_insert_with(|| Conversation::new(sender, receiver));
        conversation.messages.push(message_id);
        conversation.modified_at = Utc::now();
    }

    /// Messages of the (sender, receiver) conversation, in append order.
    pub async fn conversation_messages(&self, sender: Uuid, receiver: Uuid) -> Vec<Message> {
        let ids = match self.conversations.read().await.get(&(sender, receiver)) {
            Some(conversation) => conversation.messages.clone(),
            None => return Vec::new(),
        };
        let messages = self.messages.read().await;
        ids.iter()
            .filter_map(|id| messages.get(id).cloned())
            .collect()
    }

    /// Flip a message to read. Idempotent.
    pub async fn mark_read(&self, message_id: Uuid) {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages.get_mut(&message_id) {
            if message.status != ReadState::Read {
                message.status = ReadState::Read;
                message.modified_at = Utc::now();
            }
        }
    }

    pub async fn find_message(&self, message_id: Uuid) -> Option<Message> {
        self.messages.read().await.get(&message_id).cloned()
    }

    /// Conversations the given user initiated.
    pub async fn conversations_from(&self, sender: Uuid) -> Vec<Conversation> {
        self.conversations
            .read()
            .await
            .values()
            .filter(|c| c.sender_id == sender)
            .cloned()
            .collect()
    }

    /// Conversations initiated toward the given user.
    pub async fn conversations_to(&self, receiver: Uuid) -> Vec<Conversation> {
        self.conversations
            .read()
            .await
            .values()
            .filter(|c| c.receiver_id == receiver)
            .cloned()
            .collect()
    }
}
