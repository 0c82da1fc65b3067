pub mod health;
pub mod sign;

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::{middleware::cors_headers, state::AppState};

/// Creates the router with all handler routes.
///
/// The signing endpoint answers on every path except `/health`.
pub fn handler(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(health::handler).fallback(sign::method_not_allowed),
        )
        .route("/", signing_route())
        .route("/{*path}", signing_route())
        .layer(middleware::from_fn_with_state(state.clone(), cors_headers))
        .with_state(state)
}

fn signing_route() -> MethodRouter<AppState> {
    post(sign::sign_upload)
        .options(sign::preflight)
        .fallback(sign::method_not_allowed)
}
