//! Profile mutations: personal info, password reset, profile picture.

use serde::Deserialize;
use uuid::Uuid;

use crate::blobs::BlobStore;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::security::password;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub passion: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPassword {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub struct ProfileService;

impl ProfileService {
    pub async fn update_personal_info(
        store: &Store,
        user_id: Uuid,
        info: PersonalInfo,
    ) -> AppResult<User> {
        store
            .update_user(user_id, |user| {
                user.first_name = info.first_name;
                user.last_name = info.last_name;
                user.passion = info.passion;
                user.phone_number = info.phone_number;
            })
            .await
    }

    pub async fn reset_password(
        store: &Store,
        user: &User,
        request: ResetPassword,
    ) -> AppResult<()> {
        if !password::verify_password(&request.old_password, &user.password_hash) {
            return Err(AppError::Validation(
                "Your old password is not correct!".into(),
            ));
        }
        if password::verify_password(&request.new_password, &user.password_hash) {
            return Err(AppError::Validation(
                "Your new password can't be your old one!".into(),
            ));
        }
        if request.new_password != request.confirm_password {
            return Err(AppError::Validation(
                "Please confirm your new password!".into(),
            ));
        }
        let new_hash = password::hash_password(&request.new_password)?;
        store
            .update_user(user.id, |u| u.password_hash = new_hash)
            .await?;
        Ok(())
    }

    /// Store the uploaded image and point the profile at it.
    pub async fn update_profile_picture(
        store: &Store,
        blobs: &dyn BlobStore,
        user_id: Uuid,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::Validation("You can't upload an empty file!".into()));
        }
        let path = format!("user/{user_id}/profile.png");
        blobs.put(&path, bytes).await?;
        store
            .update_user(user_id, |user| user.profile_picture = path.clone())
            .await?;
        Ok(path)
    }
}
