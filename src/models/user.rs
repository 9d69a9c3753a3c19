// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::attempt::Attempt;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub full_name: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Why the learner studies English ("Business", "Travel", ...). Free text.
    pub learning_purpose: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// User ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub learning_purpose: Option<String>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(max = 100))]
    pub learning_purpose: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePurposeRequest {
    #[validate(length(min = 1, max = 100))]
    pub purpose: String,
}

/// Dashboard statistics with the estimated CEFR level.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_exams: usize,
    pub avg_score: f64,
    pub history: Vec<Attempt>,
    pub level: String,
    pub ai_analysis: String,
}
