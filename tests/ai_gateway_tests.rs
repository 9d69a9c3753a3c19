// tests/ai_gateway_tests.rs

mod common;

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use common::spawn_app_with_ai;
use english_proficiency::{
    config::AiConfig,
    models::question::{Difficulty, SkillType},
    services::ai::{AiError, AiGateway, OpenAiGateway},
    store::AttemptStore,
};
use serde_json::json;

/// Serves `router` as a stand-in completion API and returns its base URL.
async fn spawn_completion_api(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

fn gateway(base_url: String, timeout: Duration) -> OpenAiGateway {
    let config = AiConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        model: "test-model".to_string(),
        timeout,
    };
    OpenAiGateway::new(&config, "test-key".to_string()).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

#[tokio::test]
async fn test_valid_reply_is_parsed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|headers: HeaderMap| async move {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .is_some_and(|v| v == "Bearer test-key");
            if !authorized {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            Json(completion(r#"{"score": 72, "feedback": "Good flow."}"#)).into_response()
        }),
    );
    let base_url = spawn_completion_api(router).await;

    let grade = gateway(base_url, Duration::from_secs(2))
        .grade_essay("Hometown", "My hometown is small.")
        .await
        .unwrap();

    assert_eq!(grade.score, 72);
    assert_eq!(grade.feedback, "Good flow.");
}

#[tokio::test]
async fn test_slow_api_times_out() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(completion(r#"{"score": 90, "feedback": "late"}"#))
        }),
    );
    let base_url = spawn_completion_api(router).await;

    let err = gateway(base_url, Duration::from_millis(300))
        .grade_essay("Hometown", "text")
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_server_error_is_status() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let base_url = spawn_completion_api(router).await;

    let err = gateway(base_url, Duration::from_secs(2))
        .summarize_mistakes("Grammar", &[], "travel")
        .await
        .unwrap_err();

    match err {
        AiError::Status(code, body) => {
            assert_eq!(code, 500);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fenced_reply_is_malformed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            Json(completion(
                "```json\n{\"score\": 90, \"feedback\": \"Nice.\"}\n```",
            ))
        }),
    );
    let base_url = spawn_completion_api(router).await;

    let err = gateway(base_url, Duration::from_secs(2))
        .grade_essay("Hometown", "text")
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Malformed(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_empty_choices_is_malformed() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    );
    let base_url = spawn_completion_api(router).await;

    let err = gateway(base_url, Duration::from_secs(2))
        .estimate_level(&[], "general")
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Malformed(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_submission_recorded_when_api_fails() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let base_url = spawn_completion_api(router).await;

    let app = spawn_app_with_ai(Arc::new(gateway(base_url, Duration::from_secs(2)))).await;
    let essay = app.seed_essay("Describe your hometown.").await;
    let objective = app
        .seed_objective(SkillType::Grammar, Difficulty::Easy, "Pick one.", "A")
        .await;
    let token = app.register_and_login(None).await;

    let answers = HashMap::from([
        (essay.id, "My hometown is small and quiet.".to_string()),
        (objective.id, "B".to_string()),
    ]);
    let response = app
        .client
        .post(app.url("/api/exams/submit"))
        .bearer_auth(&token)
        .json(&json!({
            "skill_type": "Mixed",
            "difficulty": "Mixed",
            "answers": answers
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let result: serde_json::Value = response.json().await.unwrap();
    assert_eq!(result["score"], 0);
    assert_eq!(result["wrong_count"], 2);
    assert!(!result["feedback"].as_str().unwrap().is_empty());
    assert_eq!(app.state.attempts.count().await.unwrap(), 1);
}
