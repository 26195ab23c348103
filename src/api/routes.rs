use crate::api::handlers::{auth, health, users};
use crate::auth::middleware::auth_middleware;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Builds the complete application router.
///
/// Constructed once at startup and handed to the server; there is no global
/// route registry.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        // Public routes (no auth required)
        .route("/health", get(health::health))
        .route("/api/v1/login", post(auth::login));

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/api/v1/me", get(users::me))
        .route("/api/v1/user/{id}", get(users::get_user))
        .route("/api/v1/logout", post(auth::logout))
        .route("/api/v1/refresh", post(auth::refresh_token))
        .route_layer(middleware::from_fn_with_state(
            state.token_store.clone(),
            auth_middleware,
        ));

    public_routes
        .merge(protected_routes)
        .fallback(health::not_found)
        .method_not_allowed_fallback(health::method_not_allowed)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
