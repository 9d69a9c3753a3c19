use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    services::{
        ai::{self, AiGateway},
        assembler::ExamAssembler,
        difficulty::DifficultySelector,
        level::LevelReport,
        scorer::Scorer,
    },
    store::{
        AttemptStore, QuestionStore, UserStore,
        postgres::{PgAttemptStore, PgQuestionStore, PgUserStore},
    },
};

/// Collaborators shared by all handlers. Everything is constructed once at
/// startup and injected; handlers build the per-request services from it.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub questions: Arc<dyn QuestionStore>,
    pub attempts: Arc<dyn AttemptStore>,
    pub users: Arc<dyn UserStore>,
    pub ai: Arc<dyn AiGateway>,
}

impl AppState {
    /// Postgres-backed state with the AI gateway described by the config.
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let ai = ai::from_config(&config.ai);
        Self {
            questions: Arc::new(PgQuestionStore::new(pool.clone())),
            attempts: Arc::new(PgAttemptStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool)),
            ai,
            config,
        }
    }

    pub fn difficulty_selector(&self) -> DifficultySelector {
        DifficultySelector::new(self.attempts.clone())
    }

    pub fn assembler(&self) -> ExamAssembler {
        ExamAssembler::new(self.questions.clone(), self.difficulty_selector())
    }

    pub fn scorer(&self) -> Scorer {
        Scorer::new(self.questions.clone(), self.attempts.clone(), self.ai.clone())
    }

    pub fn level_report(&self) -> LevelReport {
        LevelReport::new(self.attempts.clone(), self.ai.clone())
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
