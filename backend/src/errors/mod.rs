//! Global application error types and handlers.
//!
//! `AppError` is what every handler, service and extractor returns. Its
//! `IntoResponse` impl turns it into a rendered error page (or a redirect to
//! the login form) so handlers can simply use `?`.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::auth::errors::AuthError;
use crate::views;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// User input was rejected; the message is shown to the user.
    #[error("{0}")]
    Validation(String),

    #[error("page not found")]
    NotFound,

    /// The route needs a logged-in user.
    #[error("login required")]
    Unauthorized,

    #[error("you are not allowed to do that")]
    Forbidden,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Rejected user input that a form should show next to the fields.
    pub fn is_validation(&self) -> bool {
        match self {
            AppError::Validation(_) => true,
            AppError::Auth(err) => err.is_client_error(),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Auth(err) if err.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(_)
            | AppError::Database(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the visitor. Server-side failures are not
    /// described.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "Something went wrong on our side. Please try again.".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Unauthorized) {
            return Redirect::to("/login").into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        match views::render_error(status, &self.public_message()) {
            Ok(page) => (status, Html(page)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "error page failed to render");
                (status, self.public_message()).into_response()
            }
        }
    }
}
