use crate::{
    AppState,
    auth::{self, AuthUser},
    error::AppResult,
    models::{
        BoardListPayload, BoardPayload, JoinRequest, LoginRequest, SaveBoardRequest,
        UpdateBoardRequest, UpdateUserRequest,
    },
    view::{FormSubject, Outcome, View},
};
use axum::{
    Form,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;

// --- Board Handlers ---

/// index
///
/// [Public Route] The feed: every board, newest first.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "index view", body = BoardListPayload))
)]
pub async fn index(State(state): State<AppState>) -> AppResult<View<BoardListPayload>> {
    tracing::info!("main page requested");
    let board_list = state.posts().list_all().await?;
    Ok(View::new("index", BoardListPayload { board_list }))
}

/// board_detail
///
/// [Public Route] A single board. No ownership check.
#[utoipa::path(
    get,
    path = "/board/{id}",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 200, description = "board/detail view", body = BoardPayload),
        (status = 404, description = "Not Found")
    )
)]
pub async fn board_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<View<BoardPayload>> {
    tracing::info!(board_id = id, "board detail requested");
    let board = state.posts().get(id).await?;
    Ok(View::new("board/detail", BoardPayload { board }))
}

/// save_form
///
/// [Authenticated Route] The empty "new board" form.
#[utoipa::path(
    get,
    path = "/board/save-form",
    responses(
        (status = 200, description = "board/save-form view"),
        (status = 303, description = "Login required")
    )
)]
pub async fn save_form(_auth: AuthUser) -> View<()> {
    View::new("board/save-form", ())
}

/// save_board
///
/// [Authenticated Route] Creates a board owned by the session user, then
/// returns to the feed.
#[utoipa::path(
    post,
    path = "/board/save",
    request_body(content = SaveBoardRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created, redirect to the feed"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn save_board(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Form(req): Form<SaveBoardRequest>,
) -> AppResult<Outcome> {
    req.validate()?;
    let owner = auth.as_ref().map(|a| &a.user);
    state.posts().create(req.title, req.content, owner).await?;
    Ok(Outcome::ShowList)
}

/// board_update_form
///
/// [Authenticated Route] The update form, pre-filled. Owner only.
#[utoipa::path(
    get,
    path = "/board/{id}/update-form",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 200, description = "board/update-form view", body = BoardPayload),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn board_update_form(
    AuthUser { user, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Outcome> {
    tracing::info!(board_id = id, "board update form requested");
    let board = state.posts().edit_form(id, user.id).await?;
    Ok(Outcome::ShowUpdateForm(FormSubject::Board(board)))
}

/// update_board
///
/// [Authenticated Route] Replaces title and content. Owner only.
#[utoipa::path(
    post,
    path = "/board/{id}/update-form",
    params(("id" = i64, Path, description = "Board ID")),
    request_body(content = UpdateBoardRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirect to the detail view"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_board(
    AuthUser { user, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(req): Form<UpdateBoardRequest>,
) -> AppResult<Outcome> {
    req.validate()?;
    let board = state
        .posts()
        .update(id, req.title, req.content, user.id)
        .await?;
    Ok(Outcome::ShowDetail(board.id))
}

/// delete_board
///
/// [Authenticated Route] Permanently removes a board. Owner only.
#[utoipa::path(
    post,
    path = "/board/{id}/delete",
    params(("id" = i64, Path, description = "Board ID")),
    responses(
        (status = 303, description = "Deleted, redirect to the feed"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_board(
    AuthUser { user, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Outcome> {
    state.posts().delete(id, user.id).await?;
    Ok(Outcome::ShowList)
}

// --- Account Handlers ---

/// join_form
///
/// [Public Route] The registration form.
#[utoipa::path(
    get,
    path = "/join-form",
    responses((status = 200, description = "user/join-form view"))
)]
pub async fn join_form() -> View<()> {
    View::new("user/join-form", ())
}

/// join
///
/// [Public Route] Registers a user. Does not log in; the client is sent to the
/// login form instead.
#[utoipa::path(
    post,
    path = "/join",
    request_body(content = JoinRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered, redirect to the login form"),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn join(
    State(state): State<AppState>,
    Form(req): Form<JoinRequest>,
) -> AppResult<Outcome> {
    req.validate()?;
    state
        .accounts()
        .register(req.username, req.password, req.email)
        .await?;
    Ok(Outcome::ShowLoginForm)
}

/// login_form
///
/// [Public Route] The login form.
#[utoipa::path(
    get,
    path = "/login-form",
    responses((status = 200, description = "user/login-form view"))
)]
pub async fn login_form() -> View<()> {
    View::new("user/login-form", ())
}

/// login
///
/// [Public Route] Checks the credentials, opens a session and hands its token
/// back in the session cookie. A session the client already held is cleared.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect to the feed"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<LoginRequest>,
) -> AppResult<(CookieJar, Outcome)> {
    req.validate()?;
    let user = state
        .accounts()
        .authenticate(&req.username, &req.password)
        .await?;

    // A re-login replaces whatever session the client was holding.
    if let Some(previous) = auth::session_token(&state.config, &jar) {
        state.sessions.clear(previous).await;
    }

    let token = state.sessions.open(user).await;
    let jar = jar.add(auth::session_cookie(&state.config, token));
    Ok((jar, Outcome::ShowList))
}

/// logout
///
/// [Public Route] Drops the server-side session and expires the cookie.
/// Safe to call without a session.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Logged out, redirect to the feed"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Outcome) {
    tracing::info!("logout");
    if let Some(token) = auth::session_token(&state.config, &jar) {
        state.sessions.clear(token).await;
    }
    let jar = jar.remove(auth::removal_cookie(&state.config));
    (jar, Outcome::ShowList)
}

/// user_update_form
///
/// [Authenticated Route] The profile form, pre-filled from the session.
#[utoipa::path(
    get,
    path = "/user/update-form",
    responses(
        (status = 200, description = "user/update-form view", body = crate::models::UserPayload),
        (status = 303, description = "Login required")
    )
)]
pub async fn user_update_form(AuthUser { user, .. }: AuthUser) -> Outcome {
    Outcome::ShowUpdateForm(FormSubject::User(user))
}

/// update_user
///
/// [Authenticated Route] Changes the caller's own password and email, then
/// refreshes the session payload so later requests see the new values.
#[utoipa::path(
    post,
    path = "/user/update",
    request_body(content = UpdateUserRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirect to the profile form"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_user(
    AuthUser { token, user }: AuthUser,
    State(state): State<AppState>,
    Form(req): Form<UpdateUserRequest>,
) -> AppResult<Outcome> {
    req.validate()?;
    let updated = state
        .accounts()
        .update_profile(Some(&user), req.password, req.email)
        .await?;

    state.sessions.set_current_user(token, updated).await;
    Ok(Outcome::ShowProfileForm)
}
