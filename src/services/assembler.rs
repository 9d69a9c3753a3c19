// src/services/assembler.rs

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use rand::{Rng, seq::SliceRandom};

use crate::{
    config::{MIXED_EXAM_QUOTA, MIXED_EXAM_SKILLS},
    error::AppError,
    models::{
        question::{Difficulty, Question, SkillType},
        user::User,
    },
    services::{difficulty::DifficultySelector, purpose::keywords_for},
    store::QuestionStore,
};

/// Questions for one skill at the difficulty chosen for the learner.
#[derive(Debug)]
pub struct SingleSkillExam {
    pub skill_type: SkillType,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
}

/// The 20-question mixed exam plus the level each skill would start at next.
#[derive(Debug)]
pub struct MixedExam {
    pub questions: Vec<Question>,
    pub recommended: BTreeMap<SkillType, Difficulty>,
}

#[derive(Clone)]
pub struct ExamAssembler {
    questions: Arc<dyn QuestionStore>,
    selector: DifficultySelector,
}

impl ExamAssembler {
    pub fn new(questions: Arc<dyn QuestionStore>, selector: DifficultySelector) -> Self {
        Self {
            questions,
            selector,
        }
    }

    /// Random questions from the (skill, selected difficulty) bucket, at most `limit`.
    pub async fn start_single(
        &self,
        user_id: i64,
        skill: SkillType,
        limit: usize,
    ) -> Result<SingleSkillExam, AppError> {
        let difficulty = self.selector.select(user_id, skill).await?;
        let mut pool = self.questions.find(skill, difficulty).await?;

        pool.shuffle(&mut rand::thread_rng());
        pool.truncate(limit);

        if pool.is_empty() {
            return Err(AppError::NoQuestionsAvailable(format!(
                "No {} questions available at {} level",
                skill, difficulty
            )));
        }

        Ok(SingleSkillExam {
            skill_type: skill,
            difficulty,
            questions: pool,
        })
    }

    /// Builds the mixed exam across `MIXED_EXAM_SKILLS`, biased towards the
    /// learner's purpose. Only an exam with no questions at all is an error.
    pub async fn assemble_mixed(&self, user: &User) -> Result<MixedExam, AppError> {
        let keywords = keywords_for(user.learning_purpose.as_deref());

        let mut buckets = Vec::with_capacity(MIXED_EXAM_SKILLS.len() * MIXED_EXAM_QUOTA.len());
        let mut recommended = BTreeMap::new();
        for skill in MIXED_EXAM_SKILLS {
            for (difficulty, quota) in MIXED_EXAM_QUOTA {
                let pool = self.questions.find(skill, difficulty).await?;
                if pool.len() < quota {
                    tracing::warn!(
                        %skill, %difficulty, available = pool.len(), quota,
                        "Question bucket below quota"
                    );
                }
                buckets.push((pool, quota));
            }
            recommended.insert(skill, self.selector.select(user.id, skill).await?);
        }

        let questions = assemble_from_buckets(buckets, keywords, &mut rand::thread_rng());

        if questions.is_empty() {
            return Err(AppError::NoQuestionsAvailable(
                "No questions available for the mixed exam".to_string(),
            ));
        }

        tracing::info!(
            user_id = user.id,
            count = questions.len(),
            purpose_keywords = keywords.len(),
            "Assembled mixed exam"
        );
        Ok(MixedExam {
            questions,
            recommended,
        })
    }
}

/// Fills every bucket, then shuffles the whole paper so position reveals nothing.
pub fn assemble_from_buckets<R: Rng + ?Sized>(
    buckets: Vec<(Vec<Question>, usize)>,
    keywords: &[&str],
    rng: &mut R,
) -> Vec<Question> {
    let mut paper: Vec<Question> = buckets
        .into_iter()
        .flat_map(|(pool, quota)| pick_bucket(pool, quota, keywords, rng))
        .collect();

    let mut seen = HashSet::new();
    paper.retain(|q| seen.insert(q.id));
    paper.shuffle(rng);
    paper
}

/// Selects up to `quota` questions from one bucket.
///
/// Purpose pass: random questions whose text or context mentions a keyword.
/// Fallback pass: the remainder from the questions not picked yet.
/// A bucket smaller than the quota is returned whole.
pub fn pick_bucket<R: Rng + ?Sized>(
    pool: Vec<Question>,
    quota: usize,
    keywords: &[&str],
    rng: &mut R,
) -> Vec<Question> {
    let mut seen = HashSet::new();
    let pool: Vec<Question> = pool.into_iter().filter(|q| seen.insert(q.id)).collect();

    let (mut matching, mut rest): (Vec<Question>, Vec<Question>) = if keywords.is_empty() {
        (Vec::new(), pool)
    } else {
        pool.into_iter().partition(|q| q.mentions_any(keywords))
    };

    matching.shuffle(rng);
    let from_purpose = quota.min(matching.len());
    let mut picked: Vec<Question> = matching.drain(..from_purpose).collect();

    rest.extend(matching);
    rest.shuffle(rng);
    let missing = quota - picked.len();
    picked.extend(rest.into_iter().take(missing));

    picked
}
