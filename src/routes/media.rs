use actix_web::{get, web, HttpResponse};
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

/// Stream a sent chat image by its storage path components.
#[get("/api/v1/chat/media/user/{user_id}/{file_name}")]
pub async fn get_chat_media(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
) -> AppResult<HttpResponse> {
    let (user_id, file_name) = path.into_inner();
    let bytes = state
        .blobs
        .get(&format!("chat/media/user/{user_id}/{file_name}"))
        .await?;
    Ok(HttpResponse::Ok().content_type("image/png").body(bytes))
}
