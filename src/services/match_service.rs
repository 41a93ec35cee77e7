//! The match gate: directional candidate lists with derived mutuality.

use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::User;
use crate::store::{ListAppend, Store};

/// Outcome of proposing a candidate for the owner's match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    Added { display_name: String },
    AlreadyPresent { display_name: String },
    SelfReference,
    UnknownCandidate,
}

pub struct MatchService;

impl MatchService {
    /// Append a candidate, resolved by email, to the owner's list.
    /// Rejects unknown candidates, self-reference and duplicates; the
    /// check-and-append itself is atomic at the store layer.
    pub async fn propose(store: &Store, owner: &User, candidate_email: &str) -> MatchOutcome {
        let Some(candidate) = store.find_user_by_email(candidate_email).await else {
            return MatchOutcome::UnknownCandidate;
        };
        if candidate.id == owner.id {
            return MatchOutcome::SelfReference;
        }
        match store.add_match(owner.id, candidate.id).await {
            ListAppend::Appended => {
                tracing::info!(owner = %owner.id, candidate = %candidate.id, "match proposed");
                MatchOutcome::Added {
                    display_name: candidate.display_name().to_string(),
                }
            }
            ListAppend::AlreadyPresent => MatchOutcome::AlreadyPresent {
                display_name: candidate.display_name().to_string(),
            },
        }
    }

    /// Everyone in the owner's list whose own list contains the owner,
    /// resolved to full records. No ordering guarantee.
    pub async fn list_mutual(store: &Store, owner_id: Uuid) -> AppResult<Vec<User>> {
        let proposed = store.matches_of(owner_id).await;
        let mut mutual_ids = Vec::new();
        for candidate_id in proposed {
            if store.is_mutual(owner_id, candidate_id).await {
                mutual_ids.push(candidate_id);
            }
        }
        Ok(store.find_users_by_ids(&mutual_ids).await)
    }

    /// The discovery feed: all identities except the owner and except the
    /// owner's own one-directional proposals. Deliberately not filtered by
    /// mutuality - browsing shows everyone not yet proposed-to.
    pub async fn list_unmatched(store: &Store, owner_id: Uuid) -> AppResult<Vec<User>> {
        let proposed = store.matches_of(owner_id).await;
        let users = store
            .all_users_except(owner_id)
            .await
            .into_iter()
            .filter(|u| !proposed.contains(&u.id))
            .collect();
        Ok(users)
    }
}
