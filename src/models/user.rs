use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Disabled,
}

/// A registered account. Never hard-deleted; disabling flips `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birthday: String,
    pub gender: String,
    pub interests: String,
    pub display_gender: i32,
    pub passion: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: String,
    pub phone_number: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Serializable user view for API responses and realtime frames.
/// Everything in `User` except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birthday: String,
    pub gender: String,
    pub interests: String,
    pub display_gender: i32,
    pub passion: String,
    pub email: String,
    pub profile_picture: String,
    pub phone_number: Option<String>,
}

impl User {
    pub fn new(
        first_name: String,
        last_name: String,
        birthday: String,
        gender: String,
        interests: String,
        display_gender: i32,
        passion: String,
        email: String,
        password_hash: String,
        profile_picture: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            birthday,
            gender,
            interests,
            display_gender,
            passion,
            email,
            password_hash,
            profile_picture,
            phone_number: None,
            status: AccountStatus::Active,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn display_name(&self) -> &str {
        &self.first_name
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birthday: self.birthday.clone(),
            gender: self.gender.clone(),
            interests: self.interests.clone(),
            display_gender: self.display_gender,
            passion: self.passion.clone(),
            email: self.email.clone(),
            profile_picture: self.profile_picture.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}
