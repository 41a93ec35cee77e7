//! Multi-device session tracking.
//!
//! An account holds an ordered set of currently valid tokens, one per
//! login/device. A token resolves to an identity only while the set still
//! lists it, so revocation takes effect immediately instead of at signature
//! expiry. Every authenticated operation in the service re-derives identity
//! through `resolve` rather than trusting a cached user object.

use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::security::jwt::TokenSigner;
use crate::store::Store;

pub struct SessionService {
    store: Arc<Store>,
    signer: TokenSigner,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionService {
    pub fn new(store: Arc<Store>, signer: TokenSigner, ttl: Duration, max_sessions: usize) -> Self {
        Self {
            store,
            signer,
            ttl,
            max_sessions,
        }
    }

    /// Mint a fresh token bound to the user's email claim and append it to
    /// the account's token set. Each call yields a new token value; repeated
    /// logins beyond the session cap evict the oldest token.
    pub async fn issue(&self, user: &User) -> AppResult<String> {
        let token = self.signer.sign(&user.email, self.ttl)?;
        self.store
            .append_token(user.id, token.clone(), self.max_sessions)
            .await;
        tracing::debug!(user_id = %user.id, "issued access token");
        Ok(token)
    }

    /// Remove the token from the account's set. Absent tokens are a no-op.
    pub async fn revoke(&self, user_id: Uuid, token: &str) {
        self.store.remove_token(user_id, token).await;
    }

    /// Resolve a presented token back to its account.
    ///
    /// Fails as `Unauthorized` when the signature or expiry is invalid, when
    /// the decoded account is unknown or disabled, or when the account's
    /// token set no longer lists this exact token.
    pub async fn resolve(&self, token: &str) -> AppResult<User> {
        let claims = self.signer.verify(token)?;
        let user = self
            .store
            .find_user_by_email(&claims.sub)
            .await
            .ok_or(AppError::Unauthorized)?;
        if !self.store.token_present(user.id, token).await {
            return Err(AppError::Unauthorized);
        }
        if !user.is_active() {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountStatus;

    fn service(store: Arc<Store>) -> SessionService {
        SessionService::new(
            store,
            TokenSigner::new("test-secret"),
            Duration::minutes(60),
            3,
        )
    }

    fn user(email: &str) -> User {
        User::new(
            "Alice".into(),
            "Tester".into(),
            "1990-01-01".into(),
            "woman".into(),
            "man".into(),
            1,
            "hiking".into(),
            email.into(),
            "hash".into(),
            String::new(),
        )
    }

    #[tokio::test]
    async fn issue_then_resolve_round_trip() {
        let store = Arc::new(Store::new());
        let sessions = service(store.clone());
        let alice = user("alice@tryst.app");
        store.insert_user(alice.clone()).await;

        let token = sessions.issue(&alice).await.unwrap();
        let resolved = sessions.resolve(&token).await.unwrap();
        assert_eq!(resolved.id, alice.id);
    }

    #[tokio::test]
    async fn revoked_token_no_longer_resolves() {
        let store = Arc::new(Store::new());
        let sessions = service(store.clone());
        let alice = user("alice@tryst.app");
        store.insert_user(alice.clone()).await;

        let token = sessions.issue(&alice).await.unwrap();
        sessions.revoke(alice.id, &token).await;
        assert!(matches!(
            sessions.resolve(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn session_cap_evicts_oldest_token() {
        let store = Arc::new(Store::new());
        let sessions = service(store.clone());
        let alice = user("alice@tryst.app");
        store.insert_user(alice.clone()).await;

        for _ in 0..4 {
            sessions.issue(&alice).await.unwrap();
        }
        assert_eq!(store.token_count(alice.id).await, 3);
    }

    #[tokio::test]
    async fn disabled_account_is_unauthorized() {
        let store = Arc::new(Store::new());
        let sessions = service(store.clone());
        let mut alice = user("alice@tryst.app");
        let token_user = alice.clone();
        store.insert_user(alice.clone()).await;
        let token = sessions.issue(&token_user).await.unwrap();

        alice.status = AccountStatus::Disabled;
        store.insert_user(alice).await;
        assert!(matches!(
            sessions.resolve(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let store = Arc::new(Store::new());
        let sessions = service(store);
        assert!(matches!(
            sessions.resolve("not-a-token").await,
            Err(AppError::Unauthorized)
        ));
    }
}
