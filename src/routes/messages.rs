use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppResult;
use crate::middleware::AuthedUser;
use crate::models::Profile;
use crate::services::conversation_service::SendMessage;
use crate::services::ConversationService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub receiver: String,
}

#[post("/api/v1/message")]
pub async fn send_message(
    state: web::Data<AppState>,
    auth: AuthedUser,
    body: web::Json<SendMessage>,
) -> AppResult<HttpResponse> {
    ConversationService::send_message(
        &state.store,
        state.blobs.as_ref(),
        auth.user.id,
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "A new message has been delivered successfully!"
    })))
}

/// Both directions of the caller's thread with `receiver`, ordered by
/// creation time. Viewing marks received messages as read.
#[get("/api/v1/message")]
pub async fn get_thread(
    state: web::Data<AppState>,
    auth: AuthedUser,
    query: web::Query<ThreadQuery>,
) -> AppResult<HttpResponse> {
    let thread =
        ConversationService::fetch_thread(&state.store, auth.user.id, &query.receiver).await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[get("/api/v1/message/users")]
pub async fn get_correspondents(
    state: web::Data<AppState>,
    auth: AuthedUser,
) -> AppResult<HttpResponse> {
    let users = ConversationService::list_correspondents(&state.store, auth.user.id).await?;
    let profiles: Vec<Profile> = users.iter().map(|u| u.profile()).collect();
    Ok(HttpResponse::Ok().json(profiles))
}
