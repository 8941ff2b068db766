pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{auth::SessionProvider, config::Settings, service::ServiceContext};
use state::AppState;

/// Evidence uploads go up to 15 MiB, plus multipart overhead.
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    session_provider: Arc<dyn SessionProvider>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, session_provider, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public reads and the member-facing submit flow
        .route("/members", get(handlers::members::list))
        .route("/members/:id/standings", get(handlers::members::standings))
        .route("/events", get(handlers::events::list))
        .route("/events/:id/verify", post(handlers::events::verify_code))
        .route("/submissions", get(handlers::submissions::list))
        .route("/submissions", post(handlers::submissions::create))
        // Officer portal: snapshot saves, the report, destructive reset
        .nest("/portal", portal_routes(state))
}

fn portal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/events", get(handlers::events::list_with_codes))
        .route("/events/:id/verification-code", post(handlers::events::regenerate_code))
        .route("/members", post(handlers::portal::save_members))
        .route("/officers", post(handlers::portal::save_officers))
        .route("/events", post(handlers::portal::save_events))
        .route("/submissions", post(handlers::portal::save_submissions))
        .route("/reset", post(handlers::portal::reset))
        .route("/report", get(handlers::portal::report))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_officer,
        ))
}
