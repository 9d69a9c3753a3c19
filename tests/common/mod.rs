// tests/common/mod.rs

#![allow(dead_code)]

use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use english_proficiency::{
    config::{AiConfig, Config},
    models::{
        question::{AnswerKey, Difficulty, NewQuestion, Question, SkillType},
        user::NewUser,
    },
    routes,
    services::ai::{AiGateway, DisabledGateway},
    state::AppState,
    store::{
        QuestionStore, UserStore,
        memory::{MemoryAttemptStore, MemoryQuestionStore, MemoryUserStore},
    },
    utils::hash::hash_password,
};

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by in-process stores.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_ai(Arc::new(DisabledGateway)).await
}

pub async fn spawn_app_with_ai(ai: Arc<dyn AiGateway>) -> TestApp {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        admin_email: None,
        admin_password: None,
        ai: AiConfig::default(),
    };

    let state = AppState {
        config,
        questions: Arc::new(MemoryQuestionStore::new()),
        attempts: Arc::new(MemoryAttemptStore::new()),
        users: Arc::new(MemoryUserStore::new()),
        ai,
    };

    let app = routes::create_router(state.clone());

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        state,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a learner and returns a bearer token.
    pub async fn register_and_login(&self, purpose: Option<&str>) -> String {
        let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "full_name": "Test Learner",
                "learning_purpose": purpose
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(resp.status().as_u16(), 201);

        self.login(&email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let body: serde_json::Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn admin_token(&self) -> String {
        let email = format!("admin_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
        self.state
            .users
            .create(NewUser {
                email: email.clone(),
                password_hash: hash_password("adminpass").unwrap(),
                full_name: "Admin".to_string(),
                role: "admin".to_string(),
                learning_purpose: None,
            })
            .await
            .unwrap();
        self.login(&email, "adminpass").await
    }

    pub async fn seed_objective(
        &self,
        skill: SkillType,
        difficulty: Difficulty,
        text: &str,
        key: &str,
    ) -> Question {
        let options: BTreeMap<String, String> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|k| (k.to_string(), format!("{} option", k)))
            .collect();

        self.state
            .questions
            .insert(NewQuestion {
                skill_type: skill,
                difficulty,
                question_text: text.to_string(),
                context_text: None,
                options,
                answer: AnswerKey::Objective(key.to_string()),
            })
            .await
            .unwrap()
    }

    pub async fn seed_essay(&self, topic: &str) -> Question {
        self.state
            .questions
            .insert(NewQuestion {
                skill_type: SkillType::Writing,
                difficulty: Difficulty::Easy,
                question_text: topic.to_string(),
                context_text: None,
                options: BTreeMap::new(),
                answer: AnswerKey::AiGraded,
            })
            .await
            .unwrap()
    }
}
