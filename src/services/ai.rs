// src/services/ai.rs

//! Gateway to the OpenAI-compatible completion API.
//!
//! Every call can fail: the key may be missing, the network may time out, or the
//! model may answer with something that is not the JSON we asked for. Callers get
//! an `AiError` and are expected to fall back; nothing here maps into `AppError`.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::{config::AiConfig, models::attempt::Attempt};

pub const CEFR_LEVELS: [&str; 6] = ["A1", "A2", "B1", "B2", "C1", "C2"];

#[derive(Debug)]
pub enum AiError {
    /// No API key configured.
    Disabled,
    /// Connection error or timeout.
    Transport(String),
    /// Non-2xx answer from the API.
    Status(u16, String),
    /// The reply did not have the expected shape.
    Malformed(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Disabled => write!(f, "AI gateway is disabled"),
            AiError::Transport(msg) => write!(f, "AI transport error: {}", msg),
            AiError::Status(code, msg) => write!(f, "AI API returned HTTP {}: {}", code, msg),
            AiError::Malformed(msg) => write!(f, "AI reply malformed: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}

/// Score and comment for one essay.
#[derive(Debug, Clone, PartialEq)]
pub struct EssayGrade {
    /// 0..=100
    pub score: i32,
    pub feedback: String,
}

/// A wrong objective answer, as shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mistake {
    pub question: String,
    pub your_answer: String,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelEstimate {
    /// One of `CEFR_LEVELS`.
    pub level: String,
    pub advice: String,
}

#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn grade_essay(&self, topic: &str, text: &str) -> Result<EssayGrade, AiError>;

    /// Short personalized advice built from the learner's wrong answers.
    async fn summarize_mistakes(
        &self,
        skill: &str,
        mistakes: &[Mistake],
        purpose: &str,
    ) -> Result<String, AiError>;

    /// CEFR level from recent results, with one line of advice.
    async fn estimate_level(
        &self,
        recent: &[Attempt],
        purpose: &str,
    ) -> Result<LevelEstimate, AiError>;
}

/// Used when no API key is configured.
pub struct DisabledGateway;

#[async_trait]
impl AiGateway for DisabledGateway {
    async fn grade_essay(&self, _topic: &str, _text: &str) -> Result<EssayGrade, AiError> {
        Err(AiError::Disabled)
    }

    async fn summarize_mistakes(
        &self,
        _skill: &str,
        _mistakes: &[Mistake],
        _purpose: &str,
    ) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }

    async fn estimate_level(
        &self,
        _recent: &[Attempt],
        _purpose: &str,
    ) -> Result<LevelEstimate, AiError> {
        Err(AiError::Disabled)
    }
}

/// Builds the gateway described by the config, falling back to `DisabledGateway`.
pub fn from_config(config: &AiConfig) -> Arc<dyn AiGateway> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::info!("AI_API_KEY not set, AI grading and feedback disabled");
        return Arc::new(DisabledGateway);
    };

    match OpenAiGateway::new(config, api_key) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            tracing::warn!("Failed to build AI client, AI features disabled: {}", e);
            Arc::new(DisabledGateway)
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

const ESSAY_SYSTEM: &str = "You are a strict English writing examiner. Output JSON only.";
const ADVICE_SYSTEM: &str =
    "You are an English tutor. Reply with 2-3 sentences of plain text, no lists, no JSON.";
const LEVEL_SYSTEM: &str = "You are a CEFR expert. Output JSON only.";

#[derive(Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// One chat completion; returns the trimmed text of the first choice.
    #[instrument(level = "debug", skip(self, system, user), fields(model = %self.model))]
    async fn chat(
        &self,
        system: &str,
        user: &str,
        json_reply: bool,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
            response_format: json_reply.then_some(ResponseFormat {
                r#type: "json_object",
            }),
        };

        let start = std::time::Instant::now();
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(AiError::Status(status.as_u16(), preview));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| AiError::Malformed(e.to_string()))?;
        tracing::debug!(elapsed = ?start.elapsed(), "AI completion received");

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::Malformed("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl AiGateway for OpenAiGateway {
    async fn grade_essay(&self, topic: &str, text: &str) -> Result<EssayGrade, AiError> {
        let prompt = format!(
            "Topic: {topic}\nEssay:\n{text}\n\n\
             Grade the essay for grammar, vocabulary and coherence.\n\
             Return JSON: {{\"score\": integer 0-100, \"feedback\": \"one or two sentences\"}}"
        );
        let reply = self.chat(ESSAY_SYSTEM, &prompt, true, 0.2, 300).await?;
        parse_essay_grade(&reply)
    }

    async fn summarize_mistakes(
        &self,
        skill: &str,
        mistakes: &[Mistake],
        purpose: &str,
    ) -> Result<String, AiError> {
        let listed = mistakes
            .iter()
            .map(|m| {
                format!(
                    "- {} (answered: {}, correct: {})",
                    m.question, m.your_answer, m.correct_answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Skill: {skill}\nLearning purpose: {purpose}\nMistakes:\n{listed}\n\n\
             Give short, personal advice on what to review."
        );
        let reply = self.chat(ADVICE_SYSTEM, &prompt, false, 0.5, 200).await?;
        Ok(reply)
    }

    async fn estimate_level(
        &self,
        recent: &[Attempt],
        purpose: &str,
    ) -> Result<LevelEstimate, AiError> {
        let results = recent
            .iter()
            .map(|a| format!("Skill: {}, Score: {}", a.skill_type, a.score))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Determine the CEFR level (A1-C2) for these results:\n{results}\nGoal: {purpose}\n\
             Return JSON: {{\"level\": \"B1\", \"advice\": \"short advice\"}}"
        );
        let reply = self.chat(LEVEL_SYSTEM, &prompt, true, 0.1, 150).await?;
        parse_level_estimate(&reply)
    }
}

/// The whole reply must be one JSON object of type `T`.
fn parse_strict<T: DeserializeOwned>(reply: &str) -> Result<T, AiError> {
    serde_json::from_str(reply.trim()).map_err(|e| AiError::Malformed(e.to_string()))
}

pub fn parse_essay_grade(reply: &str) -> Result<EssayGrade, AiError> {
    #[derive(Deserialize)]
    struct Payload {
        score: f64,
        feedback: String,
    }

    let payload: Payload = parse_strict(reply)?;
    if !payload.score.is_finite() || !(0.0..=100.0).contains(&payload.score) {
        return Err(AiError::Malformed(format!(
            "score {} outside 0-100",
            payload.score
        )));
    }
    let feedback = payload.feedback.trim();
    if feedback.is_empty() {
        return Err(AiError::Malformed("empty feedback".to_string()));
    }

    Ok(EssayGrade {
        score: payload.score.round() as i32,
        feedback: feedback.to_string(),
    })
}

pub fn parse_level_estimate(reply: &str) -> Result<LevelEstimate, AiError> {
    #[derive(Deserialize)]
    struct Payload {
        level: String,
        advice: String,
    }

    let payload: Payload = parse_strict(reply)?;
    let level = payload.level.trim().to_ascii_uppercase();
    if !CEFR_LEVELS.contains(&level.as_str()) {
        return Err(AiError::Malformed(format!("unknown level '{}'", payload.level)));
    }

    Ok(LevelEstimate {
        level,
        advice: payload.advice.trim().to_string(),
    })
}
