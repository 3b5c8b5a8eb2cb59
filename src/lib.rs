//! # jwt-gate
//!
//! Request-scoped JWT authentication middleware for [axum](https://docs.rs/axum)
//! and [tower](https://docs.rs/tower) pipelines.
//!
//! The gate extracts a bearer token from the `Authorization` header,
//! verifies it against a configured algorithm and key-resolution strategy,
//! and exposes the verified token plus a token-issuing capability to
//! downstream handlers through a per-request context. Requests without a
//! credential pass through unchanged — anonymous access is legal at this
//! layer. Requests with a malformed or invalid credential are answered with
//! a configurable rejection response and never reach the inner service.
//!
//! ## Attaching the gate
//!
//! ```rust,ignore
//! use jwt_gate::{Algorithm, GateConfig, JwtGateLayer};
//!
//! let config = GateConfig::builder()
//!     .secret(std::env::var("JWT_SECRET")?)
//!     .algorithm(Algorithm::HS256)
//!     .build()?;
//!
//! let app = axum::Router::new()
//!     .route("/", axum::routing::get(handler))
//!     .layer(JwtGateLayer::new(config));
//! ```
//!
//! Configuration resolution is the single validation gate: it fails at
//! pipeline-assembly time when the algorithm, key resolver, or signer cannot
//! be derived, so misconfiguration surfaces before the first request.
//!
//! Tokens are expected in the form:
//!
//! ```text
//! Authorization: Bearer xxx.yyy.zzz
//! ```
//!
//! ## Downstream handlers
//!
//! Once attached, handlers can read the verified token and its claims:
//!
//! ```rust,ignore
//! async fn auth_handler(req: Request) -> Response {
//!     let claims = match jwt_gate::claims_of(req.extensions()) {
//!         Ok(claims) => claims,
//!         Err(_) => return StatusCode::UNAUTHORIZED.into_response(),
//!     };
//!     // Find the user in claims["jti"], for example.
//! }
//! ```
//!
//! And issue new tokens with the same configuration that validated the
//! incoming one — the signer is attached even on anonymous requests, so a
//! login endpoint can mint a first token:
//!
//! ```rust,ignore
//! async fn login_handler(req: Request) -> Response {
//!     let token = jwt_gate::sign(
//!         req.extensions(),
//!         &RegisteredClaims {
//!             jti: Some("user id found if properly authenticated".into()),
//!             exp: Some(expiry),
//!             ..Default::default()
//!         }
//!         .into(),
//!     );
//!     // ...
//! }
//! ```
//!
//! For test harnesses, [`mock_context`] builds the same context shape
//! without running the live gate.

pub use jsonwebtoken;
pub use jsonwebtoken::Algorithm;

pub mod bearer;
pub mod claims;
pub mod config;
pub mod context;
pub mod layer;
pub mod mock;
pub mod signer;
pub mod verify;

pub use claims::{Claims, RegisteredClaims, Token};
pub use config::{ConfigError, GateConfig, GateConfigBuilder, RejectHandler};
pub use context::{AuthContext, ContextError, SignError, claims_of, sign, token_of};
pub use layer::{JwtGateLayer, JwtGateService};
pub use mock::mock_context;
pub use signer::{SecretSigner, Signer};
pub use verify::{KeyResolver, SecretKeyResolver, VerifyError, verify};
