use serde::{Deserialize, Serialize};

/// Credentials submitted to `register` and `login`. Fields are optional so
/// an absent field surfaces as a validation failure rather than a JSON
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[cfg(test)]
impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Result of a successful register or login.
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Response body after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}

impl AuthResponse {
    pub fn new(message: &'static str, session: AuthSession) -> Self {
        Self {
            message,
            token: session.token,
            user: session.user,
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}
