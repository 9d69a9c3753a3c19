// src/services/level.rs

use std::sync::Arc;

use crate::{
    config::STATS_RECENT_ATTEMPTS,
    error::AppError,
    models::user::{User, UserStats},
    services::ai::AiGateway,
    store::AttemptStore,
};

pub const UNRANKED_LEVEL: &str = "Unranked";
pub const PENDING_LEVEL: &str = "Calculating";

/// Dashboard statistics with an AI estimate of the CEFR level.
#[derive(Clone)]
pub struct LevelReport {
    attempts: Arc<dyn AttemptStore>,
    ai: Arc<dyn AiGateway>,
}

impl LevelReport {
    pub fn new(attempts: Arc<dyn AttemptStore>, ai: Arc<dyn AiGateway>) -> Self {
        Self { attempts, ai }
    }

    pub async fn for_user(&self, user: &User) -> Result<UserStats, AppError> {
        let history = self.attempts.all_for_user(user.id).await?;

        if history.is_empty() {
            return Ok(UserStats {
                total_exams: 0,
                avg_score: 0.0,
                history,
                level: UNRANKED_LEVEL.to_string(),
                ai_analysis: "Complete your first exam to see analysis.".to_string(),
            });
        }

        let total: i64 = history.iter().map(|a| i64::from(a.score)).sum();
        let avg_score = (total as f64 / history.len() as f64 * 10.0).round() / 10.0;

        let recent = &history[..history.len().min(STATS_RECENT_ATTEMPTS)];
        let purpose = user.learning_purpose.as_deref().unwrap_or("general");
        let (level, ai_analysis) = match self.ai.estimate_level(recent, purpose).await {
            Ok(estimate) => (estimate.level, estimate.advice),
            Err(e) => {
                tracing::warn!(user_id = user.id, "Level estimate failed: {}", e);
                (
                    PENDING_LEVEL.to_string(),
                    "Continue practicing for a detailed analysis.".to_string(),
                )
            }
        };

        Ok(UserStats {
            total_exams: history.len(),
            avg_score,
            history,
            level,
            ai_analysis,
        })
    }
}
