//! Gate configuration and its resolution.
//!
//! A [`GateConfig`] is built once at pipeline-assembly time and then shared
//! read-only across every request. Two shapes are accepted:
//!
//! - *simple*: a raw shared secret plus an algorithm, from which the key
//!   resolver and signer are synthesized;
//! - *full*: key resolver, signer, and algorithm all supplied explicitly.
//!
//! Either way, a rejection handler may be supplied and defaults to a plain
//! `401 Unauthorized`. [`GateConfigBuilder::build`] is the single validation
//! gate: anything still missing after defaulting is a [`ConfigError`], so
//! misconfiguration surfaces at startup rather than mid-traffic.
//!
//! ```rust,ignore
//! use jwt_gate::{Algorithm, GateConfig, JwtGateLayer};
//!
//! let config = GateConfig::builder()
//!     .secret("test1234")
//!     .algorithm(Algorithm::HS256)
//!     .build()?;
//!
//! let app = axum::Router::new()
//!     .route("/", get(handler))
//!     .layer(JwtGateLayer::new(config));
//! ```

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use http::{Response, StatusCode, request::Parts};
use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::signer::{SecretSigner, Signer};
use crate::verify::{KeyResolver, SecretKeyResolver};

/// Produces the rejection response for a request carrying an invalid
/// credential. Any `Fn(&Parts) -> Response<Body>` closure qualifies.
pub trait RejectHandler: Send + Sync {
    /// Build the rejection response for the given request head.
    fn reject(&self, parts: &Parts) -> Response<Body>;
}

impl<F> RejectHandler for F
where
    F: Fn(&Parts) -> Response<Body> + Send + Sync,
{
    fn reject(&self, parts: &Parts) -> Response<Body> {
        self(parts)
    }
}

fn default_reject(_parts: &Parts) -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Body::from("Unauthorized"))
        .expect("valid response")
}

/// Errors from configuration resolution. Startup-fatal: callers are expected
/// to `?` or `expect` these during pipeline assembly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No signing algorithm was configured.
    #[error("no signing algorithm configured")]
    MissingAlgorithm,
    /// No key resolver was configured and no secret to derive one from.
    #[error("no key resolver configured and no secret to derive one from")]
    MissingKeyResolver,
    /// No signer was configured and no secret to derive one from.
    #[error("no signer configured and no secret to derive one from")]
    MissingSigner,
}

/// Resolved, immutable gate configuration.
///
/// Cheap to clone; all capabilities are `Arc`-shared and safe for
/// unsynchronized concurrent reads.
#[derive(Clone)]
pub struct GateConfig {
    key_resolver: Arc<dyn KeyResolver>,
    signer: Arc<dyn Signer>,
    algorithm: Algorithm,
    reject: Arc<dyn RejectHandler>,
}

impl GateConfig {
    /// Start building a configuration.
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::default()
    }

    /// The configured key resolver.
    pub fn key_resolver(&self) -> &Arc<dyn KeyResolver> {
        &self.key_resolver
    }

    /// The configured signer.
    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    /// The configured signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The configured rejection handler.
    pub fn reject_handler(&self) -> &Arc<dyn RejectHandler> {
        &self.reject
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The capability slots are trait objects; only the algorithm renders.
        f.debug_struct("GateConfig")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GateConfig`]; see the module docs for the two legal shapes.
#[derive(Default)]
pub struct GateConfigBuilder {
    secret: Option<Vec<u8>>,
    algorithm: Option<Algorithm>,
    key_resolver: Option<Arc<dyn KeyResolver>>,
    signer: Option<Arc<dyn Signer>>,
    reject: Option<Arc<dyn RejectHandler>>,
}

impl GateConfigBuilder {
    /// Raw shared secret bytes for the simple configuration shape.
    pub fn secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Some(secret.as_ref().to_vec());
        self
    }

    /// The signing algorithm tokens must declare and the derived signer uses.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Explicit key resolver, overriding secret derivation.
    pub fn key_resolver(mut self, key_resolver: impl KeyResolver + 'static) -> Self {
        self.key_resolver = Some(Arc::new(key_resolver));
        self
    }

    /// Explicit signer, overriding secret derivation.
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Override the default `401 Unauthorized` rejection response.
    pub fn reject_handler(mut self, reject: impl RejectHandler + 'static) -> Self {
        self.reject = Some(Arc::new(reject));
        self
    }

    /// Resolve the configuration, synthesizing the key resolver and signer
    /// from the secret where they were not supplied.
    pub fn build(self) -> Result<GateConfig, ConfigError> {
        let algorithm = self.algorithm.ok_or(ConfigError::MissingAlgorithm)?;

        let key_resolver = match (self.key_resolver, &self.secret) {
            (Some(resolver), _) => resolver,
            (None, Some(secret)) => Arc::new(SecretKeyResolver::new(secret)),
            (None, None) => return Err(ConfigError::MissingKeyResolver),
        };

        let signer = match (self.signer, &self.secret) {
            (Some(signer), _) => signer,
            (None, Some(secret)) => Arc::new(SecretSigner::new(secret, algorithm)),
            (None, None) => return Err(ConfigError::MissingSigner),
        };

        Ok(GateConfig {
            key_resolver,
            signer,
            algorithm,
            reject: self.reject.unwrap_or_else(|| Arc::new(default_reject)),
        })
    }
}
