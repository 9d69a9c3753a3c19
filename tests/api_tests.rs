// tests/api_tests.rs

mod common;

use std::collections::{HashMap, HashSet};

use common::spawn_app;
use english_proficiency::{
    models::question::{Difficulty, SkillType},
    utils::jwt::sign_jwt,
};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Not an email address
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "not-an-email",
            "password": "password123",
            "full_name": "Someone"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let app = spawn_app().await;
    let body = serde_json::json!({
        "email": "twice@example.com",
        "password": "password123",
        "full_name": "Twice"
    });

    let first = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let created: serde_json::Value = first.json().await.unwrap();
    assert!(created.get("password_hash").is_none());

    let second = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": "wrongpw@example.com",
            "password": "password123",
            "full_name": "Wrong"
        }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({ "email": "wrongpw@example.com", "password": "nope-nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn exam_routes_require_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/exams/start?skill=Grammar"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_single_skill_exam_flow() {
    // Arrange: 3 Vocabulary/Easy questions, all with answer 'A'
    let app = spawn_app().await;
    for i in 0..3 {
        app.seed_objective(SkillType::Vocabulary, Difficulty::Easy, &format!("Word {}", i), "A")
            .await;
    }
    let token = app.register_and_login(None).await;

    // 1. Start: no history, so Easy
    let paper: serde_json::Value = app
        .client
        .get(app.url("/api/exams/start?skill=vocabulary&limit=5"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(paper["difficulty"], "Easy");
    assert_eq!(paper["skill_type"], "Vocabulary");
    let questions = paper["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.get("answer").is_none()));

    // 2. Submit all correct
    let answers: HashMap<i64, &str> = questions
        .iter()
        .map(|q| (q["id"].as_i64().unwrap(), "A"))
        .collect();

    let result: serde_json::Value = app
        .client
        .post(app.url("/api/exams/submit"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "skill_type": "Vocabulary",
            "difficulty": "Easy",
            "answers": answers
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["score"], 30);
    assert_eq!(result["correct_count"], 3);
    assert_eq!(result["wrong_count"], 0);
    assert_eq!(result["total_questions"], 3);
    assert!(result["feedback"].as_str().is_some());

    // 3. History has exactly that attempt
    let history: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/exams/history"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["skill_type"], "Vocabulary");
    assert_eq!(history[0]["score"], 30);
}

#[tokio::test]
async fn test_unknown_skill_is_bad_request() {
    let app = spawn_app().await;
    let token = app.register_and_login(None).await;

    let response = app
        .client
        .get(app.url("/api/exams/start?skill=Speaking"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_empty_bucket_is_not_found() {
    let app = spawn_app().await;
    let token = app.register_and_login(None).await;

    let response = app
        .client
        .get(app.url("/api/exams/start?skill=Listening"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_mixed_exam_flow() {
    let app = spawn_app().await;
    for skill in [
        SkillType::Vocabulary,
        SkillType::Grammar,
        SkillType::Reading,
        SkillType::Listening,
    ] {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for n in 0..3 {
                app.seed_objective(skill, difficulty, &format!("{skill} {difficulty} {n}"), "B")
                    .await;
            }
        }
    }
    app.seed_essay("Describe your last trip.").await;
    let token = app.register_and_login(Some("Travel")).await;

    let paper: serde_json::Value = app
        .client
        .get(app.url("/api/exams/mixed"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = paper["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 20);
    let ids: HashSet<i64> = questions.iter().map(|q| q["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 20);
    assert!(questions.iter().all(|q| q["skill_type"] != "Writing"));
    assert_eq!(paper["recommended"]["Grammar"], "Easy");

    let answers: HashMap<i64, &str> = ids.iter().map(|id| (*id, "A")).collect();
    let result: serde_json::Value = app
        .client
        .post(app.url("/api/exams/submit"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "skill_type": "Mixed",
            "difficulty": "Mixed",
            "answers": answers
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["score"], 0);
    assert_eq!(result["wrong_count"], 20);
    assert_eq!(result["total_questions"], 20);
}

#[tokio::test]
async fn test_submit_rejects_empty_answers() {
    let app = spawn_app().await;
    let token = app.register_and_login(None).await;

    let response = app
        .client
        .post(app.url("/api/exams/submit"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "skill_type": "Grammar",
            "difficulty": "Easy",
            "answers": {}
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_admin_question_management() {
    let app = spawn_app().await;
    let user_token = app.register_and_login(None).await;
    let admin_token = app.admin_token().await;

    // Learners cannot reach admin routes
    let forbidden = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    // Answer key outside the options is rejected
    let bad = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "skill_type": "Grammar",
            "difficulty": "Easy",
            "question_text": "She ___ to work.",
            "options": {"A": "go", "B": "goes"},
            "correct_option": "C"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    let created = app
        .client
        .post(app.url("/api/admin/questions"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "skill_type": "Grammar",
            "difficulty": "Easy",
            "question_text": "She ___ to work.",
            "options": {"A": "go", "B": "goes"},
            "correct_option": "B"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let bank: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/admin/questions"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bank.len(), 1);
    assert_eq!(bank[0]["answer"]["key"], "B");

    let stats: serde_json::Value = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_exams"], 0);

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let again = app
        .client
        .delete(app.url(&format!("/api/admin/questions/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn test_sixth_rapid_login_is_rate_limited() {
    let app = spawn_app().await;

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let response = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": "nobody@example.com", "password": "guess-guess" }))
            .send()
            .await
            .unwrap();
        statuses.push(response.status().as_u16());
    }

    assert_eq!(statuses[..5], [401, 401, 401, 401, 401]);
    assert_eq!(statuses[5], 429);
}

#[tokio::test]
async fn test_token_of_deleted_user_cannot_start_exam() {
    let app = spawn_app().await;
    app.seed_objective(SkillType::Grammar, Difficulty::Easy, "She ___ here.", "A")
        .await;
    let token = sign_jwt(9_999, "user", &app.state.config.jwt_secret, 600).unwrap();

    let response = app
        .client
        .get(app.url("/api/exams/start?skill=Grammar"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

/// Starts a default-length exam and answers the first `correct` questions right.
async fn take_grammar_exam(
    app: &common::TestApp,
    token: &str,
    correct: usize,
) -> (serde_json::Value, serde_json::Value) {
    let paper: serde_json::Value = app
        .client
        .get(app.url("/api/exams/start?skill=grammar"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let answers: HashMap<i64, &str> = paper["questions"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, q)| (q["id"].as_i64().unwrap(), if i < correct { "A" } else { "D" }))
        .collect();

    let result: serde_json::Value = app
        .client
        .post(app.url("/api/exams/submit"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "skill_type": "Grammar",
            "difficulty": paper["difficulty"],
            "answers": answers
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    (paper, result)
}

#[tokio::test]
async fn test_default_exam_walks_easy_medium_hard() {
    let app = spawn_app().await;
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        for n in 0..12 {
            app.seed_objective(SkillType::Grammar, difficulty, &format!("{difficulty} {n}"), "A")
                .await;
        }
    }
    let token = app.register_and_login(None).await;

    // 6 of 10 right: 60 holds at Medium
    let (paper, result) = take_grammar_exam(&app, &token, 6).await;
    assert_eq!(paper["difficulty"], "Easy");
    assert_eq!(paper["questions"].as_array().unwrap().len(), 10);
    assert_eq!(result["score"], 60);

    // All right: 100 promotes
    let (paper, result) = take_grammar_exam(&app, &token, 10).await;
    assert_eq!(paper["difficulty"], "Medium");
    assert_eq!(result["score"], 100);

    let (paper, _) = take_grammar_exam(&app, &token, 0).await;
    assert_eq!(paper["difficulty"], "Hard");
}
