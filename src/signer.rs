//! Token signing capability.
//!
//! A [`Signer`] turns a claims payload into a signed token string using a
//! fixed key and algorithm. The gate attaches the configured signer to every
//! request's context, so downstream handlers can issue fresh tokens — a login
//! endpoint on an otherwise anonymous request, for example.
//!
//! Any `Fn(&Claims) -> anyhow::Result<String>` closure is a `Signer`:
//!
//! ```rust,ignore
//! let signer = |claims: &Claims| {
//!     jsonwebtoken::encode(
//!         &Header::new(Algorithm::HS256),
//!         claims,
//!         &EncodingKey::from_secret(b"test1234"),
//!     )
//!     .map_err(Into::into)
//! };
//! ```

use crate::claims::Claims;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// Signs claims into a JWT string.
///
/// Stateless apart from the key material it closes over; one instance is
/// shared read-only across all requests.
pub trait Signer: Send + Sync {
    /// Sign the claims, returning the compact token string.
    fn sign(&self, claims: &Claims) -> anyhow::Result<String>;
}

impl<F> Signer for F
where
    F: Fn(&Claims) -> anyhow::Result<String> + Send + Sync,
{
    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        self(claims)
    }
}

/// Shared-secret signer, synthesized by the simple configuration path.
///
/// Uses `jsonwebtoken`'s default header (`typ: "JWT"` plus the algorithm).
/// HMAC signing is deterministic: signing identical claims twice under the
/// same configuration yields identical strings.
pub struct SecretSigner {
    key: EncodingKey,
    algorithm: Algorithm,
}

impl SecretSigner {
    /// Build a signer over raw HMAC secret bytes.
    pub fn new(secret: impl AsRef<[u8]>, algorithm: Algorithm) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            algorithm,
        }
    }
}

impl Signer for SecretSigner {
    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.key)
            .map_err(Into::into)
    }
}
