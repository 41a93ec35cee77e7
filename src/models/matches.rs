use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The one-directional candidate list a user has proposed matches to.
///
/// Lists are directional edges of a directed graph; mutuality is derived by
/// a double lookup, never stored. Within this service the list only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchList {
    pub user_id: Uuid,
    pub matches: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl MatchList {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            matches: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn contains(&self, candidate: Uuid) -> bool {
        self.matches.contains(&candidate)
    }
}
