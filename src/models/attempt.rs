// src/models/attempt.rs

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

use crate::{
    error::AppError,
    models::question::{Difficulty, SkillType},
};

/// Label of a submitted exam: a single skill/difficulty, or the mixed exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExamScope<T> {
    Single(T),
    Mixed,
}

const MIXED_LABEL: &str = "Mixed";

impl<T: fmt::Display> fmt::Display for ExamScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamScope::Single(inner) => inner.fmt(f),
            ExamScope::Mixed => f.write_str(MIXED_LABEL),
        }
    }
}

impl<T: FromStr<Err = AppError>> FromStr for ExamScope<T> {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(MIXED_LABEL) {
            Ok(ExamScope::Mixed)
        } else {
            s.parse().map(ExamScope::Single)
        }
    }
}

impl<T: fmt::Display> Serialize for ExamScope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A completed exam. Append-only: created once per submission, never updated.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub skill_type: ExamScope<SkillType>,
    pub difficulty: ExamScope<Difficulty>,
    pub score: i32,
    pub total_questions: i32,
    pub correct_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row of the 'exam_attempts' table.
#[derive(Debug, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub user_id: i64,
    pub skill_type: String,
    pub difficulty: String,
    pub score: i32,
    pub total_questions: i32,
    pub correct_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = AppError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Attempt {
            id: row.id,
            user_id: row.user_id,
            skill_type: row.skill_type.parse()?,
            difficulty: row.difficulty.parse()?,
            score: row.score,
            total_questions: row.total_questions,
            correct_count: row.correct_count,
            created_at: row.created_at,
        })
    }
}

/// Attempt produced by the scorer, before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    pub user_id: i64,
    pub skill_type: ExamScope<SkillType>,
    pub difficulty: ExamScope<Difficulty>,
    pub score: i32,
    pub total_questions: i32,
    pub correct_count: i32,
}

/// DTO for submitting an exam.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    /// Skill name or "Mixed".
    pub skill_type: String,

    /// Difficulty name or "Mixed".
    pub difficulty: String,

    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: selected option key, or essay text for writing questions
    pub answers: HashMap<i64, String>,
}

/// Result returned to the learner after submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamResult {
    pub score: i32,
    pub total_questions: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub feedback: String,
}
