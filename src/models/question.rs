// src/models/question.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{error::AppError, utils::html::clean_html};

/// Stored in `questions.correct_option` for answers graded by the AI gateway.
pub const AI_EVAL_SENTINEL: &str = "AI_EVAL";

/// Skill categories of the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillType {
    Vocabulary,
    Grammar,
    Reading,
    Listening,
    Writing,
}

impl SkillType {
    pub const ALL: [SkillType; 5] = [
        SkillType::Vocabulary,
        SkillType::Grammar,
        SkillType::Reading,
        SkillType::Listening,
        SkillType::Writing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::Vocabulary => "Vocabulary",
            SkillType::Grammar => "Grammar",
            SkillType::Reading => "Reading",
            SkillType::Listening => "Listening",
            SkillType::Writing => "Writing",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything else is an `InvalidSkill` error.
impl FromStr for SkillType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SkillType::ALL
            .into_iter()
            .find(|skill| skill.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::InvalidSkill(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown difficulty '{}'", wanted)))
    }
}

/// How an answer to a question is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum AnswerKey {
    /// Exact match against this option key.
    Objective(String),
    /// Free text graded by the AI gateway.
    AiGraded,
}

impl AnswerKey {
    pub fn from_stored(value: &str) -> Self {
        if value == AI_EVAL_SENTINEL {
            AnswerKey::AiGraded
        } else {
            AnswerKey::Objective(value.to_string())
        }
    }

    pub fn as_stored(&self) -> &str {
        match self {
            AnswerKey::Objective(key) => key,
            AnswerKey::AiGraded => AI_EVAL_SENTINEL,
        }
    }
}

/// A question from the bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub skill_type: SkillType,
    pub difficulty: Difficulty,
    pub question_text: String,

    /// Passage for Reading/Listening, `None` otherwise.
    pub context_text: Option<String>,

    /// Option key ("A".."D") to display text. Empty for Writing.
    pub options: BTreeMap<String, String>,

    pub answer: AnswerKey,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// True when the answer goes through AI grading instead of a key match.
    pub fn is_ai_graded(&self) -> bool {
        self.skill_type == SkillType::Writing || self.answer == AnswerKey::AiGraded
    }

    /// Display text of an option key, if the key exists.
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Case-insensitive substring match of any keyword against question or context text.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        let text = self.question_text.to_lowercase();
        let context = self
            .context_text
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        keywords.iter().any(|kw| {
            let kw = kw.to_lowercase();
            text.contains(&kw) || context.contains(&kw)
        })
    }
}

/// Writing questions have no options and are AI graded; every other skill has
/// options and an objective key that names one of them.
pub fn check_answer_shape(
    skill_type: SkillType,
    options: &BTreeMap<String, String>,
    answer: &AnswerKey,
) -> Result<(), String> {
    match (skill_type, answer) {
        (SkillType::Writing, AnswerKey::AiGraded) if options.is_empty() => Ok(()),
        (SkillType::Writing, AnswerKey::AiGraded) => {
            Err("writing questions must not have options".to_string())
        }
        (SkillType::Writing, AnswerKey::Objective(_)) => {
            Err("writing questions must be AI graded".to_string())
        }
        (_, AnswerKey::AiGraded) => Err(format!("{} questions need an answer key", skill_type)),
        (_, AnswerKey::Objective(_)) if options.is_empty() => {
            Err(format!("{} questions need options", skill_type))
        }
        (_, AnswerKey::Objective(key)) if !options.contains_key(key) => {
            Err(format!("answer key '{}' is not among the options", key))
        }
        _ => Ok(()),
    }
}

/// Row of the 'questions' table.
#[derive(Debug, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub skill_type: String,
    pub difficulty: String,
    pub question_text: String,
    pub context_text: Option<String>,
    pub options: Json<BTreeMap<String, String>>,
    pub correct_option: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = String;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let skill_type: SkillType = row.skill_type.parse().map_err(|e: AppError| e.to_string())?;
        let difficulty: Difficulty = row.difficulty.parse().map_err(|e: AppError| e.to_string())?;
        let options = row.options.0;
        let answer = AnswerKey::from_stored(&row.correct_option);

        check_answer_shape(skill_type, &options, &answer)?;

        Ok(Question {
            id: row.id,
            skill_type,
            difficulty,
            question_text: row.question_text,
            context_text: row.context_text,
            options,
            answer,
            created_at: row.created_at,
        })
    }
}

/// A question that has passed validation and awaits an id.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub skill_type: SkillType,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub context_text: Option<String>,
    pub options: BTreeMap<String, String>,
    pub answer: AnswerKey,
}

/// DTO for sending question to client (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub skill_type: SkillType,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub context_text: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            skill_type: q.skill_type,
            difficulty: q.difficulty,
            question_text: q.question_text,
            context_text: q.context_text,
            options: q.options,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 20))]
    pub skill_type: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(max = 5000))]
    pub context_text: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: BTreeMap<String, String>,
    /// Required for every skill except Writing.
    pub correct_option: Option<String>,
}

fn validate_options(options: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    for (key, text) in options {
        if key.is_empty() || key.len() > 5 {
            return Err(validator::ValidationError::new("option_key_invalid"));
        }
        if text.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

impl CreateQuestionRequest {
    /// Parses enums, sanitizes text and enforces the answer shape.
    pub fn into_new_question(self) -> Result<NewQuestion, AppError> {
        let skill_type: SkillType = self.skill_type.parse()?;
        let difficulty: Difficulty = self.difficulty.parse()?;

        let answer = match (skill_type, self.correct_option) {
            (SkillType::Writing, _) => AnswerKey::AiGraded,
            (_, Some(key)) if key != AI_EVAL_SENTINEL => AnswerKey::Objective(key),
            _ => {
                return Err(AppError::BadRequest(
                    "correct_option is required for this skill".to_string(),
                ));
            }
        };

        let options: BTreeMap<String, String> = self
            .options
            .into_iter()
            .map(|(k, v)| (k, clean_html(&v)))
            .collect();

        check_answer_shape(skill_type, &options, &answer).map_err(AppError::BadRequest)?;

        Ok(NewQuestion {
            skill_type,
            difficulty,
            question_text: clean_html(&self.question_text),
            context_text: self.context_text.as_deref().map(clean_html),
            options,
            answer,
        })
    }
}
