//! Context construction for test harnesses, outside a live pipeline.
//!
//! Builds the same [`AuthContext`] shape the gate does, without a tower
//! stack. Unlike the gate it does not reject on `valid == false`: tests often
//! need a context around a deliberately invalid token.
//!
//! ```rust,ignore
//! let req = http::Request::builder()
//!     .header("Authorization", format!("Bearer {token}"))
//!     .body(())?;
//!
//! let ctx = mock_context(
//!     &req,
//!     &SecretKeyResolver::new("test1234"),
//!     Algorithm::HS256,
//!     Arc::new(SecretSigner::new("test1234", Algorithm::HS256)),
//! )?;
//! assert!(ctx.token()?.valid);
//! ```

use std::sync::Arc;

use http::Request;
use jsonwebtoken::Algorithm;

use crate::bearer;
use crate::context::AuthContext;
use crate::signer::Signer;
use crate::verify::{KeyResolver, VerifyError, verify};

/// Build an [`AuthContext`] from a request the way the live gate would.
///
/// No bearer credential is not an error: the context still carries the
/// signer, with the token slot absent. A credential that fails to decode
/// structurally (or declares the wrong algorithm) propagates its error; one
/// that decodes but fails verification is attached with `valid == false`.
pub fn mock_context<B>(
    req: &Request<B>,
    key_resolver: &dyn KeyResolver,
    algorithm: Algorithm,
    signer: Arc<dyn Signer>,
) -> Result<AuthContext, VerifyError> {
    let ctx = AuthContext::new().with_signer(signer);

    match bearer::extract(req.headers())? {
        None => Ok(ctx),
        Some(credential) => {
            let token = verify(credential, key_resolver, algorithm)?;
            Ok(ctx.with_token(token))
        }
    }
}
