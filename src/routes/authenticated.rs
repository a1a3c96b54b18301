use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Endpoints that need a logged-in user. The router is wrapped in the session
/// middleware in `create_router`; handlers additionally take `AuthUser` and pass
/// the user into the lifecycle, where ownership is checked.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Boards ---
        // GET /board/save-form, POST /board/save
        // Create a board owned by the session user.
        .route("/board/save-form", get(handlers::save_form))
        .route("/board/save", post(handlers::save_board))
        // GET/POST /board/{id}/update-form
        // Edit a board. Owner only; others get 403.
        .route(
            "/board/{id}/update-form",
            get(handlers::board_update_form).post(handlers::update_board),
        )
        // POST /board/{id}/delete
        // Hard delete. Owner only.
        .route("/board/{id}/delete", post(handlers::delete_board))
        // --- Profile ---
        // GET /user/update-form, POST /user/update
        // Self-service password/email change. The session payload is refreshed.
        .route("/user/update-form", get(handlers::user_update_form))
        .route("/user/update", post(handlers::update_user))
}
