// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError, handlers::current_user, models::user::UpdatePurposeRequest,
    state::AppState, utils::jwt::Claims,
};

/// Get current user's profile.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(user))
}

/// Changes the learning purpose used to bias mixed exams.
pub async fn update_purpose(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdatePurposeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = state
        .users
        .update_purpose(claims.user_id()?, payload.purpose.trim())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "Learning purpose updated",
        "purpose": user.learning_purpose
    })))
}

/// Exam statistics with the estimated CEFR level.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&state, &claims).await?;
    let stats = state.level_report().for_user(&user).await?;
    Ok(Json(stats))
}
