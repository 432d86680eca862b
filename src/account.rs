//! Sign-in flows and the resolved session context

use std::sync::Arc;

use crate::auth::{IdentityProvider, Principal, Session};
use crate::error::{Error, Result};
use crate::user::{Role, UserDirectory};

/// Who is signed in and what they may do.
///
/// Passed explicitly to code that needs it; nothing caches it globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub principal: Principal,
    pub role: Role,
}

impl SessionContext {
    pub fn uid(&self) -> &str {
        &self.principal.uid
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with [`Error::Forbidden`] unless the session has the admin role
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden(format!("{} is not an admin", self.principal.uid)))
        }
    }
}

/// Account flows over an identity provider.
///
/// Every successful flow bootstraps the user document before resolving the
/// role.
#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    users: UserDirectory,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityProvider>, users: UserDirectory) -> Self {
        Self { identity, users }
    }

    /// The underlying identity provider
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    async fn context_for(&self, principal: Principal) -> Result<SessionContext> {
        self.users.ensure(&principal).await?;
        let role = self.users.role(&principal.uid).await?;
        Ok(SessionContext { principal, role })
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<SessionContext> {
        let principal = self.identity.sign_up(email, password).await?;
        self.context_for(principal).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionContext> {
        let principal = self.identity.sign_in(email, password).await?;
        self.context_for(principal).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.identity.sign_out().await
    }

    /// Resume a stored session; expired sessions are rejected
    pub async fn restore(&self, session: &Session) -> Result<SessionContext> {
        let principal = self.identity.restore(session).await?;
        self.context_for(principal).await
    }

    /// Context for an identity-change notification; `None` when signed out
    pub async fn resolve(&self, principal: Option<Principal>) -> Result<Option<SessionContext>> {
        match principal {
            Some(principal) => self.context_for(principal).await.map(Some),
            None => Ok(None),
        }
    }

    /// Context for whoever the provider currently reports as signed in
    pub async fn current(&self) -> Result<Option<SessionContext>> {
        self.resolve(self.identity.current()).await
    }
}
