use axum::{
    Json,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::models::{Board, BoardPayload, User, UserPayload};

/// View
///
/// A named view plus its data payload. Rendering is left to whatever sits in
/// front of this service; the JSON shape is `{"view": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct View<T> {
    pub view: &'static str,
    pub data: T,
}

impl<T> View<T> {
    pub fn new(view: &'static str, data: T) -> Self {
        Self { view, data }
    }
}

impl<T: Serialize> IntoResponse for View<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// The entity an update form is pre-filled with.
#[derive(Debug, Clone)]
pub enum FormSubject {
    Board(Board),
    User(User),
}

/// Outcome
///
/// Where the boundary sends the client after a core operation. Redirects use
/// `303 See Other` so a form POST is followed by a GET.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// `/board/{id}`
    ShowDetail(i64),
    /// `/`
    ShowList,
    /// Renders the update form for the given entity.
    ShowUpdateForm(FormSubject),
    /// `/user/update-form`, after a profile change.
    ShowProfileForm,
    /// `/login-form`, after a successful registration.
    ShowLoginForm,
    /// `/login-form`, because the operation needs an authenticated session.
    RequireLogin,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::ShowDetail(id) => Redirect::to(&format!("/board/{id}")).into_response(),
            Outcome::ShowList => Redirect::to("/").into_response(),
            Outcome::ShowUpdateForm(FormSubject::Board(board)) => {
                View::new("board/update-form", BoardPayload { board }).into_response()
            }
            Outcome::ShowUpdateForm(FormSubject::User(user)) => {
                View::new("user/update-form", UserPayload { user }).into_response()
            }
            Outcome::ShowProfileForm => Redirect::to("/user/update-form").into_response(),
            Outcome::ShowLoginForm | Outcome::RequireLogin => {
                Redirect::to("/login-form").into_response()
            }
        }
    }
}
