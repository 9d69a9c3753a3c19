// src/services/difficulty.rs

use std::sync::Arc;

use crate::{
    config::{HOLD_SCORE, PROMOTE_SCORE},
    error::AppError,
    models::question::{Difficulty, SkillType},
    store::AttemptStore,
};

/// Picks the next difficulty from the learner's latest attempt in a skill.
#[derive(Clone)]
pub struct DifficultySelector {
    attempts: Arc<dyn AttemptStore>,
}

impl DifficultySelector {
    pub fn new(attempts: Arc<dyn AttemptStore>) -> Self {
        Self { attempts }
    }

    pub async fn select(&self, user_id: i64, skill: SkillType) -> Result<Difficulty, AppError> {
        let last = self.attempts.most_recent(user_id, skill).await?;
        let difficulty = next_difficulty(last.map(|a| a.score));

        tracing::debug!(user_id, %skill, %difficulty, "Selected difficulty");
        Ok(difficulty)
    }
}

/// No history starts at Easy; otherwise promote, hold or demote on the last score.
pub fn next_difficulty(last_score: Option<i32>) -> Difficulty {
    match last_score {
        None => Difficulty::Easy,
        Some(score) if score >= PROMOTE_SCORE => Difficulty::Hard,
        Some(score) if score >= HOLD_SCORE => Difficulty::Medium,
        Some(_) => Difficulty::Easy,
    }
}
