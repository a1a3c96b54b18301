use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;

use crate::{
    config::AppConfig,
    error::AppError,
    models::User,
    session::{SessionState, SessionToken},
};

/// AuthUser Extractor Result
///
/// The identity resolved from the session cookie. Handlers pass `user` into
/// the lifecycle calls and keep `token` to refresh or clear the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub token: SessionToken,
    pub user: User,
}

/// resolve
///
/// Cookie → token → session store lookup. Any missing or malformed piece
/// means "anonymous", never an error.
async fn resolve<S>(parts: &Parts, state: &S) -> Option<AuthUser>
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    let sessions = SessionState::from_ref(state);
    let config = AppConfig::from_ref(state);

    let jar = CookieJar::from_headers(&parts.headers);
    let token = session_token(&config, &jar)?;

    let user = sessions.current_user(token).await?;
    Some(AuthUser { token, user })
}

/// Mandatory identity. Rejects with `AuthenticationRequired`, which the error
/// mapping turns into a redirect to the login form.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await
            .ok_or(AppError::AuthenticationRequired)
    }
}

/// Optional identity, for handlers that pass `Option<&User>` through to the
/// lifecycle and let it decide.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve(parts, state).await)
    }
}

/// Builds the cookie that carries a freshly opened session.
pub fn session_cookie(config: &AppConfig, token: SessionToken) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Builds a removal cookie matching the path of [`session_cookie`].
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .build()
}

/// Reads the session token off a cookie jar, if there is a well-formed one.
pub fn session_token(config: &AppConfig, jar: &CookieJar) -> Option<SessionToken> {
    jar.get(&config.session_cookie_name)
        .and_then(|cookie| SessionToken::parse(cookie.value()))
}
