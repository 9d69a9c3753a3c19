// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod exam;
pub mod profile;

use crate::{error::AppError, models::user::User, state::AppState, utils::jwt::Claims};

/// Loads the user behind a verified token. A deleted account is 401.
pub(crate) async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    state
        .users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))
}
