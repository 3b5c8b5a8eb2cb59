//! The request gate: tower middleware that authenticates bearer tokens.
//!
//! Per request, the gate:
//!
//! 1. attaches the configured signer to the request context unconditionally,
//!    so even an unauthenticated login endpoint can issue tokens;
//! 2. extracts the `Authorization: Bearer <token>` credential — absent means
//!    anonymous and the request passes through unchanged;
//! 3. verifies a present credential (decode, algorithm-confusion guard,
//!    signature);
//! 4. on any failure, short-circuits with the configured rejection response
//!    and never calls the inner service;
//! 5. on success, attaches the verified token and forwards.
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

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use http::{Request, Response};

use crate::bearer;
use crate::config::GateConfig;
use crate::context::AuthContext;
use crate::verify::verify;

/// Tower [`Layer`](tower::Layer) that applies [`JwtGateService`].
#[derive(Clone)]
pub struct JwtGateLayer {
    config: Arc<GateConfig>,
}

impl JwtGateLayer {
    /// Wrap a resolved configuration into a layer.
    pub fn new(config: GateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> tower::Layer<S> for JwtGateLayer {
    type Service = JwtGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JwtGateService {
            config: self.config.clone(),
            inner,
        }
    }
}

/// Tower service that authenticates requests before forwarding them.
#[derive(Clone)]
pub struct JwtGateService<S> {
    config: Arc<GateConfig>,
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for JwtGateService<S>
where
    S: tower::Service<Request<B>, Response = Response<axum::body::Body>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let config = self.config.clone();
        let mut inner = self.inner.clone();
        // swap to ensure poll_ready state is preserved
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            // The signer is attached before extraction, so even the
            // rejection handler can issue a fresh token.
            let ctx = AuthContext::new().with_signer(config.signer().clone());
            parts.extensions.insert(ctx.clone());

            let credential = match bearer::extract(&parts.headers) {
                Ok(credential) => credential.map(str::to_owned),
                Err(err) => {
                    tracing::warn!(error = %err, "rejecting request");
                    return Ok(config.reject_handler().reject(&parts));
                }
            };

            if let Some(credential) = credential {
                match verify(&credential, config.key_resolver().as_ref(), config.algorithm()) {
                    Ok(token) if token.valid => {
                        parts.extensions.insert(ctx.with_token(token));
                    }
                    Ok(_) => {
                        tracing::warn!("rejecting request with invalid bearer token");
                        return Ok(config.reject_handler().reject(&parts));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "rejecting request");
                        return Ok(config.reject_handler().reject(&parts));
                    }
                }
            }

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::Router;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use http::{StatusCode, request::Parts};
    use jsonwebtoken::Algorithm;
    use serde_json::json;
    use tower::util::ServiceExt;

    use crate::claims::{Claims, RegisteredClaims};
    use crate::config::GateConfig;
    use crate::context::{claims_of, sign, token_of};
    use crate::layer::JwtGateLayer;
    use crate::signer::{SecretSigner, Signer};

    fn config() -> GateConfig {
        GateConfig::builder()
            .secret("test1234")
            .algorithm(Algorithm::HS256)
            .build()
            .unwrap()
    }

    fn signed(secret: &str, algorithm: Algorithm) -> String {
        let claims: Claims = json!({"foo": "bar"}).as_object().unwrap().clone().into();
        SecretSigner::new(secret, algorithm).sign(&claims).unwrap()
    }

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn anonymous_request_passes_through_and_can_sign() {
        async fn handler(req: Request) -> Response {
            // No token, but the signer is present.
            assert!(token_of(req.extensions()).is_err());
            let claims: Claims = RegisteredClaims {
                jti: Some("badbadnotgood".into()),
                ..Default::default()
            }
            .into();
            sign(req.extensions(), &claims).unwrap().into_response()
        }

        let app = Router::new()
            .route("/", get(handler))
            .layer(JwtGateLayer::new(config()));

        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await.split('.').count(), 3);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        async fn handler(req: Request) -> Response {
            let token = token_of(req.extensions()).unwrap();
            assert!(token.valid);
            let claims = claims_of(req.extensions()).unwrap();
            claims["foo"].as_str().unwrap().to_owned().into_response()
        }

        let app = Router::new()
            .route("/", get(handler))
            .layer(JwtGateLayer::new(config()));

        let token = signed("test1234", Algorithm::HS256);
        let response = app
            .oneshot(request(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "bar");
    }

    #[tokio::test]
    async fn garbage_token_short_circuits() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();

        let app = Router::new()
            .route(
                "/",
                get(move || {
                    flag.store(true, Ordering::SeqCst);
                    async { StatusCode::OK }
                }),
            )
            .layer(JwtGateLayer::new(config()));

        let response = app
            .oneshot(request(Some("Bearer not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "Unauthorized");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected_not_anonymous() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = reached.clone();

        let app = Router::new()
            .route(
                "/",
                get(move || {
                    flag.store(true, Ordering::SeqCst);
                    async { StatusCode::OK }
                }),
            )
            .layer(JwtGateLayer::new(config()));

        let response = app
            .oneshot(request(Some("Basic dXNlcjpwdw==")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn algorithm_confusion_is_rejected() {
        // Correctly signed with the right secret, but under HS512 while the
        // gate is configured for HS256.
        let app = Router::new()
            .route("/", get(|| async { StatusCode::OK }))
            .layer(JwtGateLayer::new(config()));

        let token = signed("test1234", Algorithm::HS512);
        let response = app
            .oneshot(request(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let app = Router::new()
            .route("/", get(|| async { StatusCode::OK }))
            .layer(JwtGateLayer::new(config()));

        let token = signed("wrong-secret", Algorithm::HS256);
        let response = app
            .oneshot(request(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn custom_reject_handler_is_used() {
        let config = GateConfig::builder()
            .secret("test1234")
            .algorithm(Algorithm::HS256)
            .reject_handler(|_: &Parts| {
                http::Response::builder()
                    .status(StatusCode::UNAUTHORIZED)
                    .body(Body::from(r#"{"code": "unauthorized"}"#))
                    .unwrap()
            })
            .build()
            .unwrap();

        let app = Router::new()
            .route("/", get(|| async { StatusCode::OK }))
            .layer(JwtGateLayer::new(config));

        let response = app
            .oneshot(request(Some("Bearer not.a.token")))
            .await
            .unwrap();
        assert_eq!(body_string(response).await, r#"{"code": "unauthorized"}"#);
    }

    #[tokio::test]
    async fn reject_handler_can_sign_a_fresh_token() {
        // The signer is attached before extraction, so a rejection response
        // can mint a replacement token for an invalid credential.
        let config = GateConfig::builder()
            .secret("test1234")
            .algorithm(Algorithm::HS256)
            .reject_handler(|parts: &Parts| {
                let claims: Claims = RegisteredClaims {
                    jti: Some("fresh".into()),
                    ..Default::default()
                }
                .into();
                let token = sign(&parts.extensions, &claims).unwrap();
                http::Response::builder()
                    .status(StatusCode::UNAUTHORIZED)
                    .body(Body::from(token))
                    .unwrap()
            })
            .build()
            .unwrap();

        let app = Router::new()
            .route("/", get(|| async { StatusCode::OK }))
            .layer(JwtGateLayer::new(config));

        let response = app
            .oneshot(request(Some("Bearer not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await.split('.').count(), 3);
    }

    #[tokio::test]
    async fn signing_is_consistent_across_requests() {
        async fn handler(req: Request) -> Response {
            let claims: Claims = RegisteredClaims {
                jti: Some("test".into()),
                ..Default::default()
            }
            .into();
            sign(req.extensions(), &claims).unwrap().into_response()
        }

        let app = Router::new()
            .route("/", get(handler))
            .layer(JwtGateLayer::new(config()));

        let first = body_string(app.clone().oneshot(request(None)).await.unwrap()).await;
        let second = body_string(app.oneshot(request(None)).await.unwrap()).await;
        // Two independent request contexts over one configuration; HMAC
        // signing is deterministic so the outputs match byte for byte.
        assert_eq!(first, second);
    }
}
