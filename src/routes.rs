// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{
        AI_RATE_BURST, AI_RATE_REPLENISH_SECS, API_RATE_BURST, API_RATE_REPLENISH_SECS,
        AUTH_RATE_BURST, AUTH_RATE_REPLENISH_SECS,
    },
    handlers::{admin, auth, exam, profile},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, users, exams, admin).
/// * Applies global middleware (Trace, CORS, rate limit).
/// * Injects the shared `AppState`.
///
/// Rate limits key on the peer IP, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Limits are non-zero constants, so `finish` always yields a config
    let auth_limit = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(AUTH_RATE_REPLENISH_SECS)
            .burst_size(AUTH_RATE_BURST)
            .finish()
            .expect("auth rate limit is non-zero"),
    );
    let ai_limit = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(AI_RATE_REPLENISH_SECS)
            .burst_size(AI_RATE_BURST)
            .finish()
            .expect("AI rate limit is non-zero"),
    );
    let api_limit = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(API_RATE_REPLENISH_SECS)
            .burst_size(API_RATE_BURST)
            .finish()
            .expect("API rate limit is non-zero"),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(auth_limit));

    let user_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/purpose", post(profile::update_purpose))
        .route(
            "/stats",
            get(profile::get_stats).layer(GovernorLayer::new(ai_limit.clone())),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let exam_routes = Router::new()
        .route("/start", get(exam::start_exam))
        .route("/mixed", get(exam::start_mixed_exam))
        .route(
            "/submit",
            post(exam::submit_exam).layer(GovernorLayer::new(ai_limit)),
        )
        .route("/history", get(exam::history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/stats", get(admin::system_stats))
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/{id}", delete(admin::delete_question))
        // Auth runs first (outermost), then the admin check
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(admin_middleware)),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/exams", exam_routes)
        .nest("/admin", admin_routes)
        .layer(GovernorLayer::new(api_limit));

    Router::new()
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
