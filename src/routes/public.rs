use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Board reads are public; everything
/// here either reads or starts/ends a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // The feed, newest board first.
        .route("/", get(handlers::index))
        // GET /board/{id}
        // Board detail. No ownership check on reads.
        .route("/board/{id}", get(handlers::board_detail))
        // GET /join-form, POST /join
        // Registration. A successful join redirects to the login form.
        .route("/join-form", get(handlers::join_form))
        .route("/join", post(handlers::join))
        // GET /login-form, POST /login
        // Login. Success sets the session cookie.
        .route("/login-form", get(handlers::login_form))
        .route("/login", post(handlers::login))
        // GET /logout
        // Clears the session if there is one.
        .route("/logout", get(handlers::logout))
}
