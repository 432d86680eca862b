//! Identity provider seam and the hosted auth client

mod local;
mod session;
mod types;

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::fetch::Transport;

pub use local::LocalIdentity;
pub use session::*;
pub use types::*;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    /// Subject assigned by the identity provider
    pub uid: String,
    pub email: Option<String>,
}

/// Email/password identity provider.
///
/// Implementations track the signed-in principal and publish every change to
/// subscribers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal>;

    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;

    /// Resume a previously issued session. Expired sessions are rejected.
    async fn restore(&self, session: &Session) -> Result<Principal>;

    /// The signed-in principal, if any
    fn current(&self) -> Option<Principal>;

    /// The current session, if any
    fn session(&self) -> Option<Session>;

    /// Receiver observing sign-in state changes
    fn subscribe(&self) -> watch::Receiver<Option<Principal>>;
}

fn check_restorable(session: &Session) -> Result<Principal> {
    if session.is_expired() {
        return Err(Error::auth("Session expired"));
    }
    session.principal()
}

struct AuthState {
    session: Mutex<Option<Session>>,
    changes: watch::Sender<Option<Principal>>,
}

impl AuthState {
    fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            session: Mutex::new(None),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Client for the hosted authentication endpoints
#[derive(Clone)]
pub struct AuthClient {
    transport: Transport,
    state: Arc<AuthState>,
}

impl AuthClient {
    /// Create a new auth client.
    ///
    /// The session token is written to the transport's token slot, which the
    /// data clients built from the same slot read on every request.
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            state: Arc::new(AuthState::new()),
        }
    }

    fn auth_path(path: &str) -> String {
        format!("/auth/v1{}", path)
    }

    fn install(&self, session: Option<Session>, principal: Option<Principal>) {
        self.transport
            .token()
            .set(session.as_ref().map(|s| s.access_token.clone()));
        *self.state.lock() = session;
        self.state.changes.send_replace(principal);
    }

    async fn grant(&self, path: &str, email: &str, password: &str) -> Result<Principal> {
        let response = self
            .transport
            .post(&Self::auth_path(path))
            .header("Authorization", &format!("Bearer {}", self.transport.key()))
            .json(&Credentials { email, password })?
            .execute::<AuthResponse>()
            .await
            .map_err(|err| match err {
                Error::Store { message, .. } => Error::auth(message),
                other => other,
            })?;

        let principal = match response.session() {
            Some(session) => {
                let principal = match response.principal() {
                    Some(principal) => principal,
                    None => session.principal()?,
                };
                self.install(Some(session), Some(principal.clone()));
                principal
            }
            None => response
                .principal()
                .ok_or_else(|| Error::auth("Response carried neither a session nor a user"))?,
        };
        Ok(principal)
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal> {
        self.grant("/signup", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        self.grant("/token?grant_type=password", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        let token = match self.session() {
            Some(session) => session.access_token,
            None => return Err(Error::auth("Not logged in")),
        };

        let result = self
            .transport
            .post(&Self::auth_path("/logout"))
            .bearer_auth(&token)
            .execute_unit()
            .await;

        // The local session ends even when the backend call fails.
        self.install(None, None);
        result
    }

    async fn restore(&self, session: &Session) -> Result<Principal> {
        let principal = check_restorable(session)?;
        self.install(Some(session.clone()), Some(principal.clone()));
        Ok(principal)
    }

    fn current(&self) -> Option<Principal> {
        self.state.changes.borrow().clone()
    }

    fn session(&self) -> Option<Session> {
        self.state.lock().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.state.changes.subscribe()
    }
}
