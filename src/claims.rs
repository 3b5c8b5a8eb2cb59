//! Claims and token types.
//!
//! A [`Token`] is the decoded form of a bearer credential: the JOSE header,
//! the claims payload, and the verification outcome. [`Claims`] is the
//! payload itself, either as an open `String -> Value` map (the shape every
//! incoming token decodes to) or as the fixed set of registered claim names
//! from [RFC 7519 §4.1](https://datatracker.ietf.org/doc/html/rfc7519#section-4.1)
//! for callers building a payload to sign.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The payload of a JWT, in one of two shapes.
///
/// Incoming tokens always decode to [`Claims::Map`]. [`Claims::Registered`]
/// exists for the signing side, where a caller usually wants the well-known
/// claim names without assembling a map by hand.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Claims {
    /// An open mapping of claim names to values.
    Map(Map<String, Value>),
    /// The registered claim names only.
    Registered(RegisteredClaims),
}

impl Claims {
    /// Look up a claim by name, in either shape.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Claims::Map(map) => map.get(name).cloned(),
            Claims::Registered(reg) => reg.get(name),
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Claims::Map(map)
    }
}

impl From<RegisteredClaims> for Claims {
    fn from(registered: RegisteredClaims) -> Self {
        Claims::Registered(registered)
    }
}

/// Registered JWT claim names (RFC 7519 §4.1). All optional; absent fields
/// are omitted from the encoded payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Expiration time, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Not-before time, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Issued-at time, seconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// Token identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl RegisteredClaims {
    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "iss" => self.iss.clone().map(Value::from),
            "sub" => self.sub.clone().map(Value::from),
            "aud" => self.aud.clone().map(Value::from),
            "exp" => self.exp.map(Value::from),
            "nbf" => self.nbf.map(Value::from),
            "iat" => self.iat.map(Value::from),
            "jti" => self.jti.clone().map(Value::from),
            _ => None,
        }
    }
}

/// A decoded bearer credential.
///
/// Produced once per request by verification and never mutated afterwards.
/// `valid` reports the cryptographic/temporal outcome; a token that decoded
/// structurally but failed its signature or `exp` check still carries its
/// header and claims with `valid == false`.
#[derive(Clone, Debug)]
pub struct Token {
    /// The JOSE header, including the declared signing algorithm.
    pub header: jsonwebtoken::Header,
    /// The decoded payload.
    pub claims: Claims,
    /// Whether signature and temporal validation passed.
    pub valid: bool,
}
