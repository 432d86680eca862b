//! Short human-readable product identifiers

use rand::Rng;

use crate::error::{Error, Result};
use crate::store::{DocumentStore, Query};

/// Characters a product identifier is drawn from
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Column holding the identifier on product documents
pub const PRODUCT_ID_FIELD: &str = "productId";

/// Bounds for [`ProductIdGenerator::generate_unique`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPolicy {
    /// Identifier length tried first
    pub length: usize,
    /// Candidates tried per length before giving up on it
    pub max_attempts: usize,
    /// Longer length tried once `length` is exhausted
    pub fallback_length: usize,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self {
            length: 5,
            max_attempts: 16,
            fallback_length: 8,
        }
    }
}

/// Sample `len` characters uniformly, with replacement, from [`ALPHABET`]
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// A 5-character identifier from the thread-local generator
pub fn generate() -> String {
    generate_with(&mut rand::thread_rng(), IdPolicy::default().length)
}

/// Issues identifiers no existing product carries.
///
/// The check does not reserve the identifier; callers must rely on the
/// store's uniqueness constraint to catch a concurrent create.
pub struct ProductIdGenerator<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    policy: IdPolicy,
}

impl<'a> ProductIdGenerator<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: &'a str, policy: IdPolicy) -> Self {
        Self {
            store,
            collection,
            policy,
        }
    }

    /// Whether a product already carries `candidate`
    pub async fn is_taken(&self, candidate: &str) -> Result<bool> {
        let query = Query::new().eq(PRODUCT_ID_FIELD, candidate);
        self.store.exists(self.collection, &query).await
    }

    /// First candidate with no matching product.
    ///
    /// Tries `max_attempts` candidates at the primary length, then as many at
    /// the fallback length, and reports [`Error::IdentifierExhausted`] when
    /// every one of them is taken.
    pub async fn generate_unique(&self) -> Result<String> {
        let mut attempts = 0;
        for len in [self.policy.length, self.policy.fallback_length] {
            for _ in 0..self.policy.max_attempts {
                attempts += 1;
                let candidate = generate_with(&mut rand::thread_rng(), len);
                log::debug!("product id attempt {}: {}", attempts, candidate);
                if !self.is_taken(&candidate).await? {
                    return Ok(candidate);
                }
                log::warn!("product id {} already taken", candidate);
            }
        }
        Err(Error::IdentifierExhausted { attempts })
    }
}
