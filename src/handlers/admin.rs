// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError, models::question::CreateQuestionRequest, state::AppState,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// User and attempt totals.
/// Admin only.
pub async fn system_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let total_users = state.users.count().await?;
    let total_exams = state.attempts.count().await?;

    Ok(Json(serde_json::json!({
        "total_users": total_users,
        "total_exams": total_exams
    })))
}

/// The whole question bank, answer keys included.
/// Admin only.
pub async fn list_questions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let questions = state.questions.all().await?;
    Ok(Json(questions))
}

/// Adds a question to the bank.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = state.questions.insert(payload.into_new_question()?).await?;
    tracing::info!(question_id = question.id, skill = %question.skill_type, "Question created");

    Ok((StatusCode::CREATED, Json(question)))
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.questions.delete(id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
