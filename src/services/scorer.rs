// src/services/scorer.rs

use std::{collections::HashMap, sync::Arc};

use crate::{
    config::{AI_FALLBACK_SCORE, AI_PASS_SCORE, POINTS_PER_QUESTION},
    error::AppError,
    models::{
        attempt::{ExamResult, ExamScope, NewAttempt},
        question::{AnswerKey, Difficulty, SkillType},
        user::User,
    },
    services::ai::{AiGateway, Mistake},
    store::{AttemptStore, QuestionStore},
};

pub const AI_UNAVAILABLE_FEEDBACK: &str =
    "Automatic essay grading is unavailable right now; a default score was recorded.";

/// A validated submission, consumed once by `Scorer::score`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub skill_type: ExamScope<SkillType>,
    pub difficulty: ExamScope<Difficulty>,
    pub answers: HashMap<i64, String>,
}

/// Tally of one submission before feedback is written.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    score: i32,
    correct: i32,
    wrong: i32,
    mistakes: Vec<Mistake>,
    essay_feedback: Vec<String>,
}

/// Grades submissions and records exactly one attempt per submission.
#[derive(Clone)]
pub struct Scorer {
    questions: Arc<dyn QuestionStore>,
    attempts: Arc<dyn AttemptStore>,
    ai: Arc<dyn AiGateway>,
}

impl Scorer {
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        attempts: Arc<dyn AttemptStore>,
        ai: Arc<dyn AiGateway>,
    ) -> Self {
        Self {
            questions,
            attempts,
            ai,
        }
    }

    pub async fn score(&self, user: &User, submission: Submission) -> Result<ExamResult, AppError> {
        if submission.answers.is_empty() {
            return Err(AppError::BadRequest("No answers submitted".to_string()));
        }

        let mut tally = Tally::default();

        // Sorted for a stable order in the feedback.
        let mut answers: Vec<(i64, String)> = submission.answers.into_iter().collect();
        answers.sort_by_key(|(id, _)| *id);
        let total_questions = answers.len() as i32;

        for (question_id, answer) in answers {
            let Some(question) = self.questions.find_by_id(question_id).await? else {
                tracing::debug!(question_id, "Skipping answer to unknown question");
                continue;
            };

            if question.is_ai_graded() {
                let (score, feedback) =
                    match self.ai.grade_essay(&question.question_text, &answer).await {
                        Ok(grade) => (grade.score, grade.feedback),
                        Err(e) => {
                            tracing::warn!(question_id, "Essay grading failed: {}", e);
                            (AI_FALLBACK_SCORE, AI_UNAVAILABLE_FEEDBACK.to_string())
                        }
                    };
                tally.score += score;
                if score >= AI_PASS_SCORE {
                    tally.correct += 1;
                } else {
                    tally.wrong += 1;
                }
                tally.essay_feedback.push(feedback);
                continue;
            }

            let AnswerKey::Objective(key) = &question.answer else {
                continue;
            };
            if &answer == key {
                tally.correct += 1;
                tally.score += POINTS_PER_QUESTION;
            } else {
                tally.wrong += 1;
                tally.mistakes.push(Mistake {
                    question: question.question_text.clone(),
                    your_answer: question.option_text(&answer).unwrap_or(&answer).to_string(),
                    correct_answer: question.option_text(key).unwrap_or(key).to_string(),
                });
            }
        }

        let feedback = self
            .feedback(&tally, &submission.skill_type, user.learning_purpose.as_deref())
            .await;

        let attempt = self
            .attempts
            .append(NewAttempt {
                user_id: user.id,
                skill_type: submission.skill_type,
                difficulty: submission.difficulty,
                score: tally.score,
                total_questions,
                correct_count: tally.correct,
            })
            .await?;

        tracing::info!(
            user_id = user.id,
            attempt_id = attempt.id,
            skill = %attempt.skill_type,
            score = attempt.score,
            "Exam submitted"
        );

        Ok(ExamResult {
            score: tally.score,
            total_questions,
            correct_count: tally.correct,
            wrong_count: tally.wrong,
            feedback,
        })
    }

    /// Essay comments first, then advice on the wrong answers (AI or tiered).
    async fn feedback(
        &self,
        tally: &Tally,
        skill: &ExamScope<SkillType>,
        purpose: Option<&str>,
    ) -> String {
        let mut parts = tally.essay_feedback.clone();

        if !tally.mistakes.is_empty() {
            let purpose = purpose.unwrap_or("general");
            match self
                .ai
                .summarize_mistakes(&skill.to_string(), &tally.mistakes, purpose)
                .await
            {
                Ok(advice) => parts.push(advice),
                Err(e) => {
                    tracing::warn!("Mistake summary failed: {}", e);
                    parts.push(tiered_feedback(tally.score).to_string());
                }
            }
        } else if parts.is_empty() {
            parts.push(tiered_feedback(tally.score).to_string());
        }

        parts.join("\n\n")
    }
}

/// Fixed message by total score, used whenever AI advice is not available.
pub fn tiered_feedback(score: i32) -> &'static str {
    if score >= 80 {
        "Excellent work! You have a strong command of this material."
    } else if score >= 50 {
        "Good job. Review the questions you missed to move up a level."
    } else {
        "This area needs review. Revisit the basics and try again."
    }
}
