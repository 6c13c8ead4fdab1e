//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Programs
        .route("/programs", post(handlers::create_program))
        .route("/programs/:id", get(handlers::get_program))
        .route(
            "/programs/:id/collaborations",
            post(handlers::invite_collaborator),
        )
        .route("/programs/:id/submit", post(handlers::submit_program))
        // Collaborations
        .route(
            "/collaborations/:id/respond",
            post(handlers::respond_to_collaboration),
        )
        .route(
            "/collaborations/:id/opt-out",
            post(handlers::opt_out_of_collaboration),
        )
        .route(
            "/admins/:id/collaborations",
            get(handlers::list_admin_collaborations),
        )
        // Superadmin review
        .route("/superadmin/queue", get(handlers::superadmin_queue))
        .route(
            "/superadmin/programs/:id/decision",
            post(handlers::decide_program),
        )
        // Events
        .route("/events/stream", get(handlers::stream_events));

    // Build router with middleware
    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
