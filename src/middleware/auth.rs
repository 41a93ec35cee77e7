//! Request-level identity extraction.
//!
//! `AuthedUser` re-derives the caller's identity from the presented bearer
//! token on every request via the session store, so a token revoked between
//! requests fails immediately. Handlers receive the resolved account plus
//! the raw token (logout needs it).

use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

#[derive(Clone)]
pub struct AuthedUser {
    pub user: User,
    pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

impl FromRequest for AuthedUser {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let token = token.ok_or(AppError::Unauthorized)?;
            let state = state.ok_or(AppError::Unauthorized)?;
            let user = state.sessions.resolve(&token).await?;
            Ok(AuthedUser { user, token })
        })
    }
}
