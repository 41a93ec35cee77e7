use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::security::password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub birthday: String,
    pub gender: String,
    pub interests: String,
    pub display_gender: i32,
    pub passion: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile_picture: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[post("/api/v1/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    if state.store.find_user_by_email(&body.email).await.is_some() {
        return Err(AppError::Validation("User already signed up!".into()));
    }

    let password_hash = password::hash_password(&body.password)?;
    let user = User::new(
        body.first_name,
        body.last_name,
        body.birthday,
        body.gender,
        body.interests,
        body.display_gender,
        body.passion,
        body.email,
        password_hash,
        body.profile_picture,
    );
    state.store.insert_user(user.clone()).await;
    let token = state.sessions.issue(&user).await?;
    tracing::info!(user_id = %user.id, "account registered");

    Ok(HttpResponse::Created().json(json!({
        "user": user.profile(),
        "token": { "access_token": token, "token_type": "bearer" },
        "message": "Welcome. Start matchin'!",
    })))
}

#[post("/api/v1/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let user = state
        .store
        .find_user_by_email(&body.email)
        .await
        .ok_or_else(|| AppError::NotFound("User not found!".into()))?;
    if !password::verify_password(&body.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = state.sessions.issue(&user).await?;
    Ok(HttpResponse::Ok().json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user.profile(),
    })))
}
