//! Request-scoped context carrying the signer capability and verified token.
//!
//! [`AuthContext`] is an explicit struct with two named optional slots rather
//! than a generic keyed bag, so both slots stay type-checked and each missing
//! slot is its own error. The gate inserts one into the request's
//! [`http::Extensions`]; downstream handlers reach it through the free
//! functions here or through `axum::Extension`:
//!
//! ```rust,ignore
//! async fn whoami(Extension(ctx): Extension<AuthContext>) -> Response {
//!     match ctx.claims() {
//!         Ok(claims) => Json(claims.clone()).into_response(),
//!         Err(_) => StatusCode::UNAUTHORIZED.into_response(),
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use http::Extensions;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claims::{Claims, Token};
use crate::signer::Signer;

/// A lookup failed because the slot was never populated.
///
/// `MissingSigner` means the request never passed through the gate (or a
/// mock); `MissingToken` means it did, but anonymously. Callers can therefore
/// tell "not authenticated" apart from "misused outside the gate".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// No signer in the context.
    #[error("missing signer in request context")]
    MissingSigner,
    /// No verified token in the context.
    #[error("missing token in request context")]
    MissingToken,
    /// The token's claims are not the open-map shape.
    #[error("token claims are not an open claims map")]
    ClaimsShape,
}

/// Errors from [`sign`].
#[derive(Error, Debug)]
pub enum SignError {
    /// The context carried no signer.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The signer itself failed.
    #[error("signing failed: {0}")]
    Signer(#[source] anyhow::Error),
}

/// Per-request authentication context.
///
/// Append-only: the `with_*` builders consume the context and return an
/// extended one, never mutating a value someone else still holds. Cloning is
/// cheap; both slots are `Arc`-shared.
#[derive(Clone, Default)]
pub struct AuthContext {
    signer: Option<Arc<dyn Signer>>,
    token: Option<Arc<Token>>,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The signer slot is a trait object; report presence only.
        f.debug_struct("AuthContext")
            .field("signer", &self.signer.is_some())
            .field("token", &self.token)
            .finish()
    }
}

impl AuthContext {
    /// An empty context with both slots absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the context with a signer capability.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Extend the context with a verified token.
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(Arc::new(token));
        self
    }

    /// The signer capability, if the request passed through the gate.
    pub fn signer(&self) -> Result<&Arc<dyn Signer>, ContextError> {
        self.signer.as_ref().ok_or(ContextError::MissingSigner)
    }

    /// The decoded token, if the request carried one.
    pub fn token(&self) -> Result<&Token, ContextError> {
        self.token
            .as_deref()
            .ok_or(ContextError::MissingToken)
    }

    /// The token's claims as an open map.
    ///
    /// Fails with [`ContextError::ClaimsShape`] when the stored claims are
    /// the registered-only shape; an error rather than an empty map, so a
    /// token that genuinely carried zero claims stays distinguishable.
    pub fn claims(&self) -> Result<&Map<String, Value>, ContextError> {
        match &self.token()?.claims {
            Claims::Map(map) => Ok(map),
            Claims::Registered(_) => Err(ContextError::ClaimsShape),
        }
    }

    /// Sign claims with the signer in this context.
    pub fn sign(&self, claims: &Claims) -> Result<String, SignError> {
        self.signer()?.sign(claims).map_err(SignError::Signer)
    }
}

fn context(extensions: &Extensions, missing: ContextError) -> Result<&AuthContext, ContextError> {
    extensions.get::<AuthContext>().ok_or(missing)
}

/// Sign claims with the signer attached to the request.
///
/// Fails with a missing-signer error when the request never passed through
/// the gate.
pub fn sign(extensions: &Extensions, claims: &Claims) -> Result<String, SignError> {
    context(extensions, ContextError::MissingSigner)?.sign(claims)
}

/// The verified token attached to the request.
///
/// Fails with a missing-token error on anonymous requests.
pub fn token_of(extensions: &Extensions) -> Result<&Token, ContextError> {
    context(extensions, ContextError::MissingToken)?.token()
}

/// The claims of the verified token attached to the request, as an open map.
pub fn claims_of(extensions: &Extensions) -> Result<&Map<String, Value>, ContextError> {
    context(extensions, ContextError::MissingToken)?.claims()
}
