// src/store/mod.rs

//! Persistence seams.
//!
//! Handlers and services only see these traits. `postgres` backs the running
//! server, `memory` keeps everything in process for tests and local demos.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt},
        question::{Difficulty, NewQuestion, Question, SkillType},
        user::{NewUser, User},
    },
};

/// Read side of the question bank, plus the admin write operations.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// All questions of one (skill, difficulty) bucket.
    async fn find(&self, skill: SkillType, difficulty: Difficulty)
    -> Result<Vec<Question>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError>;

    async fn all(&self) -> Result<Vec<Question>, AppError>;

    async fn insert(&self, question: NewQuestion) -> Result<Question, AppError>;

    /// Returns false when no question had this id.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// Append-only exam history.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Latest single-skill attempt of the user for this skill.
    async fn most_recent(&self, user_id: i64, skill: SkillType)
    -> Result<Option<Attempt>, AppError>;

    async fn append(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;

    /// Newest first.
    async fn all_for_user(&self, user_id: i64) -> Result<Vec<Attempt>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn update_purpose(&self, id: i64, purpose: &str) -> Result<Option<User>, AppError>;

    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
