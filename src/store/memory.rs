// src/store/memory.rs

//! In-process stores. Same contracts as the Postgres ones, no database needed.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, ExamScope, NewAttempt},
        question::{Difficulty, NewQuestion, Question, SkillType},
        user::{NewUser, User},
    },
    store::{AttemptStore, QuestionStore, UserStore},
};

/// A poisoned lock only means another test thread panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MemoryQuestionStore {
    questions: Mutex<Vec<Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds questions as-is, keeping their ids.
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Mutex::new(questions),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn find(
        &self,
        skill: SkillType,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AppError> {
        Ok(lock(&self.questions)
            .iter()
            .filter(|q| q.skill_type == skill && q.difficulty == difficulty)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(lock(&self.questions).iter().find(|q| q.id == id).cloned())
    }

    async fn all(&self) -> Result<Vec<Question>, AppError> {
        Ok(lock(&self.questions).clone())
    }

    async fn insert(&self, q: NewQuestion) -> Result<Question, AppError> {
        let mut questions = lock(&self.questions);
        let id = questions.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        let question = Question {
            id,
            skill_type: q.skill_type,
            difficulty: q.difficulty,
            question_text: q.question_text,
            context_text: q.context_text,
            options: q.options,
            answer: q.answer,
            created_at: Some(Utc::now()),
        };
        questions.push(question.clone());
        Ok(question)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut questions = lock(&self.questions);
        let before = questions.len();
        questions.retain(|q| q.id != id);
        Ok(questions.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: Mutex<Vec<Attempt>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; ids break timestamp ties.
fn newest_first(attempts: &mut [Attempt]) {
    attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn most_recent(
        &self,
        user_id: i64,
        skill: SkillType,
    ) -> Result<Option<Attempt>, AppError> {
        let mut matching: Vec<Attempt> = lock(&self.attempts)
            .iter()
            .filter(|a| a.user_id == user_id && a.skill_type == ExamScope::Single(skill))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching.into_iter().next())
    }

    async fn append(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let mut attempts = lock(&self.attempts);
        let stored = Attempt {
            id: attempts.len() as i64 + 1,
            user_id: attempt.user_id,
            skill_type: attempt.skill_type,
            difficulty: attempt.difficulty,
            score: attempt.score,
            total_questions: attempt.total_questions,
            correct_count: attempt.correct_count,
            created_at: Utc::now(),
        };
        attempts.push(stored.clone());
        Ok(stored)
    }

    async fn all_for_user(&self, user_id: i64) -> Result<Vec<Attempt>, AppError> {
        let mut mine: Vec<Attempt> = lock(&self.attempts)
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut mine);
        Ok(mine)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.attempts).len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = lock(&self.users);
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        let created = User {
            id: users.len() as i64 + 1,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            learning_purpose: user.learning_purpose,
            created_at: Some(Utc::now()),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users).iter().find(|u| u.id == id).cloned())
    }

    async fn update_purpose(&self, id: i64, purpose: &str) -> Result<Option<User>, AppError> {
        let mut users = lock(&self.users);
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.learning_purpose = Some(purpose.to_string());
            u.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users = lock(&self.users).clone();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(lock(&self.users).len() as i64)
    }
}
