use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The set of currently valid access tokens for one account.
///
/// Created lazily on first login. Tokens are appended in issue order and
/// removed exactly once on logout; the set may end up empty but the record
/// is never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub user_id: Uuid,
    pub tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            tokens: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}
