//! Session tokens and the claims they carry

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Principal;

/// Claims read from an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Session data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds at issue time
    #[serde(default)]
    pub expires_in: i64,
    /// Expiry timestamp, when the backend reported one
    #[serde(default)]
    pub expires_at: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Create a new session expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(Utc::now().timestamp() + expires_in),
        }
    }

    /// Decode the access token claims.
    ///
    /// The signature is not checked here; the backend verifies the token on
    /// every request it is sent with.
    pub fn claims(&self) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(&self.access_token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    /// Decode the access token claims, checking its HS256 signature against
    /// `secret`. Expiry is left to [`Session::is_expired`].
    pub fn verified_claims(&self, secret: &[u8]) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(&self.access_token, &DecodingKey::from_secret(secret), &validation)?;
        Ok(data.claims)
    }

    /// The principal the token was issued to
    pub fn principal(&self) -> Result<Principal> {
        let claims = self.claims()?;
        Ok(Principal {
            uid: claims.sub,
            email: claims.email,
        })
    }

    /// Expiry timestamp: the token's `exp` claim, else `expires_at`
    pub fn expiry(&self) -> Option<i64> {
        self.claims().ok().map(|claims| claims.exp).or(self.expires_at)
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expiry() {
            Some(expiry) => Utc::now().timestamp() >= expiry,
            None => false,
        }
    }
}
