//! Bearer credential extraction from the `Authorization` header.
//!
//! "No token in the request" and "invalid token" are distinct conditions:
//! a missing header means anonymous access and passes through the gate,
//! while a header that is present but not `Bearer <token>` is treated as an
//! invalid credential and rejected.

use http::HeaderMap;

use crate::verify::VerifyError;

/// Extract the bearer credential from the request headers.
///
/// Returns `Ok(None)` when no `Authorization` header is present (anonymous),
/// `Ok(Some(token))` for `Authorization: Bearer <token>`, and
/// [`VerifyError::MalformedHeader`] for anything else — a non-UTF-8 value,
/// a different scheme, or a bare `Bearer` with no credential.
pub fn extract(headers: &HeaderMap) -> Result<Option<&str>, VerifyError> {
    let Some(value) = headers.get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or(VerifyError::MalformedHeader)
}

#[cfg(test)]
mod tests {
    use crate::bearer::extract;
    use crate::verify::VerifyError;
    use http::{HeaderMap, HeaderValue, header};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn absent_header_is_anonymous() {
        assert_eq!(extract(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn extracts_bearer_credential() {
        assert_eq!(extract(&headers("Bearer x.y.z")).unwrap(), Some("x.y.z"));
    }

    #[test]
    fn wrong_scheme_is_malformed() {
        let err = extract(&headers("Basic dXNlcjpwdw==")).unwrap_err();
        assert!(matches!(err, VerifyError::MalformedHeader));
    }

    #[test]
    fn empty_credential_is_malformed() {
        assert!(extract(&headers("Bearer ")).is_err());
        assert!(extract(&headers("Bearer")).is_err());
    }
}
