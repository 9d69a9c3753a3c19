// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::models::question::{Difficulty, SkillType};

/// Points awarded for each correctly answered objective question.
pub const POINTS_PER_QUESTION: i32 = 10;

/// An AI-graded answer scoring at least this much counts as correct.
pub const AI_PASS_SCORE: i32 = 60;

/// Score substituted for an AI-graded answer when the grading call fails.
pub const AI_FALLBACK_SCORE: i32 = 0;

/// Last-attempt score at or above which the next exam is Hard.
pub const PROMOTE_SCORE: i32 = 80;

/// Last-attempt score at or above which the next exam is Medium.
pub const HOLD_SCORE: i32 = 50;

/// Skills covered by the mixed exam. Writing needs AI grading and is left out.
pub const MIXED_EXAM_SKILLS: [SkillType; 4] = [
    SkillType::Vocabulary,
    SkillType::Grammar,
    SkillType::Reading,
    SkillType::Listening,
];

/// Per-skill difficulty quota of the mixed exam (5 questions per skill).
pub const MIXED_EXAM_QUOTA: [(Difficulty, usize); 3] = [
    (Difficulty::Easy, 2),
    (Difficulty::Medium, 2),
    (Difficulty::Hard, 1),
];

/// Default and maximum number of questions for a single-skill exam.
/// Ten objective questions put a full score at 100, on the same scale as the
/// difficulty cut-offs.
pub const DEFAULT_EXAM_LIMIT: usize = 10;
pub const MAX_EXAM_LIMIT: usize = 50;

/// Auth routes: burst of 5, one more every 3 minutes (5 per 15 minutes).
pub const AUTH_RATE_BURST: u32 = 5;
pub const AUTH_RATE_REPLENISH_SECS: u64 = 180;

/// Routes that call the AI gateway: 10 per minute.
pub const AI_RATE_BURST: u32 = 10;
pub const AI_RATE_REPLENISH_SECS: u64 = 6;

/// Every API route: 100 per 15 minutes.
pub const API_RATE_BURST: u32 = 100;
pub const API_RATE_REPLENISH_SECS: u64 = 9;

/// Number of recent attempts sent to the level estimate.
pub const STATS_RECENT_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub ai: AiConfig,
}

/// Settings for the OpenAI-compatible completion API.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables every AI call; scoring falls back to defaults.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = AiConfig::default();
        let ai = AiConfig {
            api_key: env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            base_url: env::var("AI_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("AI_MODEL").unwrap_or(defaults.model),
            timeout: env::var("AI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            ai,
        }
    }
}
