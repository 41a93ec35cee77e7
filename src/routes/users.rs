use actix_web::{get, put, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthedUser;
use crate::models::Profile;
use crate::services::profile_service::{PersonalInfo, ResetPassword};
use crate::services::{MatchService, ProfileService};
use crate::state::AppState;

#[get("/api/v1/user/profile")]
pub async fn get_profile(auth: AuthedUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(auth.user.profile()))
}

/// The discovery feed: everyone not yet proposed-to by the caller.
#[get("/api/v1/user/all")]
pub async fn get_all_users(
    state: web::Data<AppState>,
    auth: AuthedUser,
) -> AppResult<HttpResponse> {
    let users = MatchService::list_unmatched(&state.store, auth.user.id).await?;
    let profiles: Vec<Profile> = users.iter().map(|u| u.profile()).collect();
    Ok(HttpResponse::Ok().json(profiles))
}

/// Revokes exactly the presented token; other devices stay logged in.
#[get("/api/v1/user/logout")]
pub async fn logout(state: web::Data<AppState>, auth: AuthedUser) -> AppResult<HttpResponse> {
    state.sessions.revoke(auth.user.id, &auth.token).await;
    Ok(HttpResponse::Ok().json(json!({ "message": "Good Bye!" })))
}

#[put("/api/v1/user")]
pub async fn update_personal_info(
    state: web::Data<AppState>,
    auth: AuthedUser,
    body: web::Json<PersonalInfo>,
) -> AppResult<HttpResponse> {
    let updated =
        ProfileService::update_personal_info(&state.store, auth.user.id, body.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(updated.profile()))
}

#[put("/api/v1/user/password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    auth: AuthedUser,
    body: web::Json<ResetPassword>,
) -> AppResult<HttpResponse> {
    ProfileService::reset_password(&state.store, &auth.user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Your password has been reset successfully!"
    })))
}

#[put("/api/v1/user/profile-image")]
pub async fn upload_profile_image(
    state: web::Data<AppState>,
    auth: AuthedUser,
    bytes: web::Bytes,
) -> AppResult<HttpResponse> {
    ProfileService::update_profile_picture(
        &state.store,
        state.blobs.as_ref(),
        auth.user.id,
        bytes.to_vec(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile picture has been uploaded successfully!"
    })))
}

/// Unauthenticated image streaming, as profile pictures are public.
#[get("/api/v1/user/{user_id}/profile.png")]
pub async fn get_profile_image(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    let bytes = state.blobs.get(&format!("user/{user_id}/profile.png")).await?;
    Ok(HttpResponse::Ok().content_type("image/png").body(bytes))
}
