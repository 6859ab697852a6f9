//! services/api/src/web/mod.rs
//!
//! Router assembly: public routes, routes behind `require_auth`, Swagger UI,
//! and the CORS and tracing layers.

pub mod envelope;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_auth;

use crate::config::Config;
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/positions", get(rest::get_positions))
        .route(
            "/positions/{position_public_id}/interviews",
            get(rest::get_position_interviews),
        )
        .route("/position/{position_public_id}", get(rest::get_position))
        .route(
            "/position/{position_public_id}/skills",
            post(rest::add_skills_to_position).delete(rest::delete_skills_from_position),
        )
        .route(
            "/position/{position_public_id}/questions",
            get(rest::get_position_questions),
        )
        .route(
            "/company/{company_public_id}/positions",
            get(rest::get_positions_by_company),
        )
        .route(
            "/recruiter/{recruiter_public_id}/positions",
            get(rest::get_positions_by_recruiter),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/position", post(rest::create_position))
        .route("/position/{position_public_id}", put(rest::update_position))
        .route(
            "/position/{position_public_id}/questions",
            post(rest::add_questions_to_position),
        )
        .route(
            "/position/{position_public_id}/interview",
            post(rest::create_interview),
        )
        .route(
            "/question/{question_public_id}",
            put(rest::update_question).delete(rest::delete_question),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Restricts CORS to the configured origin, or allows any origin when none is set.
fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    match config.cors_origin.as_deref().map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]),
        Some(Err(e)) => {
            warn!("Ignoring unparsable CORS_ORIGIN: {}", e);
            permissive(methods)
        }
        None => permissive(methods),
    }
}

fn permissive(methods: [Method; 5]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods)
        .allow_headers(Any)
}
