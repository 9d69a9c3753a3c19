// src/handlers/exam.rs

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_EXAM_LIMIT, MAX_EXAM_LIMIT},
    error::AppError,
    handlers::current_user,
    models::{
        attempt::SubmitExamRequest,
        question::{Difficulty, PublicQuestion, SkillType},
    },
    services::scorer::Submission,
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct StartExamParams {
    pub skill: String,
    pub limit: Option<usize>,
}

/// Single-skill exam paper. Answer keys never leave the server.
#[derive(Debug, Serialize)]
pub struct ExamPaper {
    pub skill_type: SkillType,
    pub difficulty: Difficulty,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct MixedExamPaper {
    pub questions: Vec<PublicQuestion>,
    /// Difficulty each skill would start at in a single-skill exam.
    pub recommended: BTreeMap<SkillType, Difficulty>,
}

/// Starts a single-skill exam at the difficulty picked from the learner's history.
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<StartExamParams>,
) -> Result<impl IntoResponse, AppError> {
    let skill: SkillType = params.skill.parse()?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_EXAM_LIMIT)
        .clamp(1, MAX_EXAM_LIMIT);
    let user = current_user(&state, &claims).await?;

    let exam = state.assembler().start_single(user.id, skill, limit).await?;

    Ok(Json(ExamPaper {
        skill_type: exam.skill_type,
        difficulty: exam.difficulty,
        questions: exam.questions.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Starts the mixed exam, biased towards the learner's purpose.
pub async fn start_mixed_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&state, &claims).await?;

    let exam = state.assembler().assemble_mixed(&user).await?;

    Ok(Json(MixedExamPaper {
        questions: exam.questions.into_iter().map(PublicQuestion::from).collect(),
        recommended: exam.recommended,
    }))
}

/// Grades a submission and records the attempt.
///
/// * Objective questions: 10 points per exact key match.
/// * Writing questions: the AI grade is added as-is; an AI outage never fails the request.
pub async fn submit_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = Submission {
        skill_type: req.skill_type.parse()?,
        difficulty: req.difficulty.parse()?,
        answers: req.answers,
    };
    let user = current_user(&state, &claims).await?;

    let result = state.scorer().score(&user, submission).await?;

    Ok(Json(result))
}

/// The caller's attempts, newest first.
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = state.attempts.all_for_user(claims.user_id()?).await?;
    Ok(Json(attempts))
}
