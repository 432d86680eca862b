//! Wire types for the identity endpoints

use serde::{Deserialize, Serialize};

use super::{Principal, Session};

/// Body of the sign-up and password grant requests
#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authentication response.
///
/// Sign-up returns only the user when email confirmation is pending.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub expires_at: Option<i64>,
    pub user: Option<User>,
    /// Unconfirmed sign-ups come back as a bare user object
    pub id: Option<String>,
    pub email: Option<String>,
}

impl AuthResponse {
    /// The session, if the response granted one
    pub fn session(&self) -> Option<Session> {
        let access_token = self.access_token.clone()?;
        Some(Session {
            access_token,
            refresh_token: self.refresh_token.clone().unwrap_or_default(),
            token_type: self.token_type.clone().unwrap_or_else(|| "bearer".to_string()),
            expires_in: self.expires_in.unwrap_or_default(),
            expires_at: self.expires_at,
        })
    }

    /// The principal the response describes
    pub fn principal(&self) -> Option<Principal> {
        match &self.user {
            Some(user) => Some(user.principal()),
            None => self.id.as_ref().map(|id| Principal {
                uid: id.clone(),
                email: self.email.clone(),
            }),
        }
    }
}

/// User data
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub email_confirmed_at: Option<String>,
    pub last_sign_in_at: Option<String>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            uid: self.id.clone(),
            email: self.email.clone(),
        }
    }
}
