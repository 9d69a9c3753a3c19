// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptRow, NewAttempt},
        question::{Difficulty, NewQuestion, Question, QuestionRow, SkillType},
        user::{NewUser, User},
    },
    store::{AttemptStore, QuestionStore, UserStore},
};

const QUESTION_COLUMNS: &str =
    "id, skill_type, difficulty, question_text, context_text, options, correct_option, created_at";

const ATTEMPT_COLUMNS: &str =
    "id, user_id, skill_type, difficulty, score, total_questions, correct_count, created_at";

const USER_COLUMNS: &str = "id, email, password_hash, full_name, role, learning_purpose, created_at";

/// Converts rows, dropping the ones that break the question invariant.
fn into_questions(rows: Vec<QuestionRow>) -> Vec<Question> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            Question::try_from(row)
                .map_err(|reason| {
                    tracing::warn!(question_id = id, %reason, "Skipping malformed question row");
                })
                .ok()
        })
        .collect()
}

fn into_attempts(rows: Vec<AttemptRow>) -> Result<Vec<Attempt>, AppError> {
    rows.into_iter().map(Attempt::try_from).collect()
}

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn find(
        &self,
        skill: SkillType,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE skill_type = $1 AND difficulty = $2"
        ))
        .bind(skill.as_str())
        .bind(difficulty.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions for {}/{}: {:?}", skill, difficulty, e);
            AppError::from(e)
        })?;

        Ok(into_questions(rows))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| into_questions(vec![r]).pop()))
    }

    async fn all(&self) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(into_questions(rows))
    }

    async fn insert(&self, q: NewQuestion) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            INSERT INTO questions
            (skill_type, difficulty, question_text, context_text, options, correct_option)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {QUESTION_COLUMNS}
            "#
        ))
        .bind(q.skill_type.as_str())
        .bind(q.difficulty.as_str())
        .bind(&q.question_text)
        .bind(&q.context_text)
        .bind(Json(&q.options))
        .bind(q.answer.as_stored())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

        Question::try_from(row).map_err(AppError::InternalServerError)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn most_recent(
        &self,
        user_id: i64,
        skill: SkillType,
    ) -> Result<Option<Attempt>, AppError> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM exam_attempts
            WHERE user_id = $1 AND skill_type = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(skill.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Attempt::try_from).transpose()
    }

    async fn append(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            INSERT INTO exam_attempts
            (user_id, skill_type, difficulty, score, total_questions, correct_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(attempt.user_id)
        .bind(attempt.skill_type.to_string())
        .bind(attempt.difficulty.to_string())
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(attempt.correct_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam attempt: {:?}", e);
            AppError::from(e)
        })?;

        Attempt::try_from(row)
    }

    async fn all_for_user(&self, user_id: i64) -> Result<Vec<Attempt>, AppError> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM exam_attempts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_attempts(rows)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exam_attempts")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, learning_purpose)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.role)
        .bind(&user.learning_purpose)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique_violation {
                AppError::Conflict(format!("Email '{}' is already registered", user.email))
            } else {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn update_purpose(&self, id: i64, purpose: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET learning_purpose = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(purpose)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::from(e)
        })?;
        Ok(users)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
