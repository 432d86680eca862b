//! In-process identity provider for tests and local development

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::error::{Error, Result};

use super::{Claims, IdentityProvider, Principal, Session};

const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Registered credentials. Only a salted SHA-256 digest of the password is
/// kept.
struct Account {
    uid: String,
    salt: [u8; 16],
    digest: Vec<u8>,
}

impl Account {
    fn new(uid: String, password: &str) -> Self {
        let salt = rand::random::<[u8; 16]>();
        Self {
            uid,
            salt,
            digest: password_digest(&salt, password),
        }
    }

    fn verify(&self, password: &str) -> bool {
        password_digest(&self.salt, password) == self.digest
    }
}

fn password_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
}

/// Identity provider keeping accounts in memory and issuing HS256 tokens
/// signed with a local secret.
#[derive(Clone)]
pub struct LocalIdentity {
    state: Arc<RwLock<State>>,
    changes: Arc<watch::Sender<Option<Principal>>>,
    secret: Arc<Vec<u8>>,
}

impl Default for LocalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::with_secret(uuid::Uuid::new_v4().as_bytes())
    }

    pub fn with_secret(secret: &[u8]) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            state: Arc::new(RwLock::new(State::default())),
            changes: Arc::new(changes),
            secret: Arc::new(secret.to_vec()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Mint a session for `principal` valid for `lifetime_secs` (negative
    /// values yield an already expired session).
    pub fn issue(&self, principal: &Principal, lifetime_secs: i64) -> Result<Session> {
        let claims = Claims {
            sub: principal.uid.clone(),
            email: principal.email.clone(),
            exp: Utc::now().timestamp() + lifetime_secs,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))?;
        Ok(Session::new(token, uuid::Uuid::new_v4().simple().to_string(), lifetime_secs))
    }

    fn start(&self, principal: Principal) -> Result<Principal> {
        let session = self.issue(&principal, TOKEN_LIFETIME_SECS)?;
        self.write().session = Some(session);
        self.changes.send_replace(Some(principal.clone()));
        Ok(principal)
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal> {
        if password.is_empty() {
            return Err(Error::auth("Password is required"));
        }
        let uid = {
            let mut state = self.write();
            if state.accounts.contains_key(email) {
                return Err(Error::auth("User already registered"));
            }
            let uid = uuid::Uuid::new_v4().to_string();
            state
                .accounts
                .insert(email.to_string(), Account::new(uid.clone(), password));
            uid
        };
        self.start(Principal {
            uid,
            email: Some(email.to_string()),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        let uid = {
            let state = self.read();
            match state.accounts.get(email) {
                Some(account) if account.verify(password) => account.uid.clone(),
                _ => return Err(Error::auth("Invalid login credentials")),
            }
        };
        self.start(Principal {
            uid,
            email: Some(email.to_string()),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        if self.write().session.take().is_none() {
            return Err(Error::auth("Not logged in"));
        }
        self.changes.send_replace(None);
        Ok(())
    }

    /// Only sessions signed with this provider's secret are accepted.
    async fn restore(&self, session: &Session) -> Result<Principal> {
        if session.is_expired() {
            return Err(Error::auth("Session expired"));
        }
        let claims = session.verified_claims(&self.secret)?;
        let principal = Principal {
            uid: claims.sub,
            email: claims.email,
        };
        self.write().session = Some(session.clone());
        self.changes.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    fn current(&self) -> Option<Principal> {
        self.changes.borrow().clone()
    }

    fn session(&self) -> Option<Session> {
        self.read().session.clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.changes.subscribe()
    }
}
