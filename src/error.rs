//! Error kinds of the auth flow and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{jwt::TokenError, repo::StoreError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("email and password are required")]
    InvalidInput,

    #[error("password must be at least {min} characters long")]
    WeakPassword { min: usize },

    #[error("email already exists")]
    EmailExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// Store failure while creating a user.
    #[error("error creating user: {0}")]
    CreateUser(#[source] StoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput
            | AuthError::WeakPassword { .. }
            | AuthError::EmailExists
            | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::CreateUser(_)
            | AuthError::Store(_)
            | AuthError::Token(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Server-side failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput => "Email and password are required".into(),
            AuthError::WeakPassword { min } => {
                format!("Password must be at least {min} characters long")
            }
            AuthError::EmailExists => "Email already exists".into(),
            AuthError::InvalidCredentials => "Invalid credentials".into(),
            AuthError::CreateUser(_) => "Error creating user".into(),
            AuthError::Store(_) | AuthError::Token(_) | AuthError::Internal(_) => {
                "Server error".into()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(json!({ "message": self.public_message() }));
        (status, body).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
