use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: entity store, session store, ownership guard and the two lifecycles.
pub mod repository;
pub mod session;
pub mod authorization;
pub mod posts;
pub mod accounts;

// Boundary: errors, views, extractors, handlers, configuration.
pub mod error;
pub mod view;
pub mod auth;
pub mod handlers;
pub mod models;
pub mod config;

// Routing split by access level (Public, Authenticated).
pub mod routes;
use routes::{authenticated, public};
use auth::AuthUser;

// --- Public Re-exports ---

pub use accounts::Accounts;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use posts::Posts;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};
pub use session::{MemorySessionStore, SessionState};

/// ApiDoc
///
/// OpenAPI document for every handler decorated with `#[utoipa::path]`,
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::board_detail, handlers::save_form, handlers::save_board,
        handlers::board_update_form, handlers::update_board, handlers::delete_board,
        handlers::join_form, handlers::join, handlers::login_form, handlers::login,
        handlers::logout, handlers::user_update_form, handlers::update_user
    ),
    components(
        schemas(
            models::User, models::Board, models::SaveBoardRequest, models::UpdateBoardRequest,
            models::JoinRequest, models::LoginRequest, models::UpdateUserRequest,
            models::BoardListPayload, models::BoardPayload, models::UserPayload,
        )
    ),
    tags(
        (name = "blog", description = "Session-authenticated blog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned into
/// every request.
#[derive(Clone)]
pub struct AppState {
    /// Entity store for users and boards.
    pub repo: RepositoryState,
    /// Server-side session store keyed by the session cookie.
    pub sessions: SessionState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn posts(&self) -> Posts {
        Posts::new(self.repo.clone())
    }

    pub fn accounts(&self) -> Accounts {
        Accounts::new(self.repo.clone())
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated router. Extracting `AuthUser` fails with
/// `AuthenticationRequired` when no session resolves, which short-circuits the
/// request into a redirect to the login form before any handler runs.
async fn auth_middleware(
    _auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing table, applies the session guard and the observability
/// layers, and attaches the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware
                ))
        )
        .with_state(state);

    // Outermost first: request id, then the trace span that reads it, then
    // propagation of the id back onto the response.
    base_router
        .layer(
             ServiceBuilder::new()
                 .layer(SetRequestIdLayer::new(
                     x_request_id.clone(),
                     MakeRequestUuid,
                 ))
                 .layer(
                     TraceLayer::new_for_http()
                         .make_span_with(trace_span_logger)
                         .on_response(
                             DefaultOnResponse::new()
                                 .level(Level::INFO)
                                 .latency_unit(tower_http::LatencyUnit::Millis)
                         )
                 )
                 .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, uri and the `x-request-id`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
