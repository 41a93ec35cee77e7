use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthedUser;
use crate::models::Profile;
use crate::services::match_service::{MatchOutcome, MatchService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddMatchRequest {
    #[serde(rename = "match")]
    pub candidate: String,
}

#[post("/api/v1/matches")]
pub async fn add_match(
    state: web::Data<AppState>,
    auth: AuthedUser,
    body: web::Json<AddMatchRequest>,
) -> AppResult<HttpResponse> {
    match MatchService::propose(&state.store, &auth.user, &body.candidate).await {
        MatchOutcome::Added { display_name } => Ok(HttpResponse::Created().json(json!({
            "message": format!("{display_name} has been added to your matches list!"),
        }))),
        MatchOutcome::AlreadyPresent { display_name } => Err(AppError::Validation(format!(
            "{display_name} already exist in your matches list!"
        ))),
        MatchOutcome::SelfReference => Err(AppError::Validation(
            "You can't add yourself to your matches list!".into(),
        )),
        MatchOutcome::UnknownCandidate => Err(AppError::Validation(
            "You can't add a non existing user to your matches list!".into(),
        )),
    }
}

#[get("/api/v1/matches")]
pub async fn get_matches(
    state: web::Data<AppState>,
    auth: AuthedUser,
) -> AppResult<HttpResponse> {
    let matches = MatchService::list_mutual(&state.store, auth.user.id).await?;
    let profiles: Vec<Profile> = matches.iter().map(|u| u.profile()).collect();
    Ok(HttpResponse::Ok().json(profiles))
}
