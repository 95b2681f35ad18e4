//! Request admission checks
//!
//! Pure predicates over request headers, run before any body handling:
//! bearer authentication and Origin validation.

use axum::http::{header, HeaderMap, StatusCode};
use sha2::{Digest, Sha256};

/// A refused request, mapped to an HTTP status plus a human-readable reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDenial {
    pub status: StatusCode,
    pub message: &'static str,
}

/// Bearer-token check.
///
/// With no configured tokens, authentication is disabled entirely
/// (default-open mode for local deployments).
pub struct AuthGate {
    token_digests: Vec<[u8; 32]>,
}

impl AuthGate {
    pub fn new(tokens: &[String]) -> Self {
        Self {
            token_digests: tokens.iter().map(|token| Self::digest(token)).collect(),
        }
    }

    /// SHA-256 both sides so comparison cost does not depend on how long a
    /// matching prefix the attacker has guessed.
    fn digest(token: &str) -> [u8; 32] {
        Sha256::digest(token.as_bytes()).into()
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GateDenial> {
        if self.token_digests.is_empty() {
            return Ok(());
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Err(GateDenial {
                status: StatusCode::UNAUTHORIZED,
                message: "Authorization required",
            });
        };

        let supplied = Self::digest(token);
        if self.token_digests.iter().any(|allowed| allowed == &supplied) {
            Ok(())
        } else {
            Err(GateDenial {
                status: StatusCode::FORBIDDEN,
                message: "Invalid bearer token",
            })
        }
    }
}

/// Exact-match Origin allow-list.
///
/// An absent `Origin` header always passes; it covers same-origin and
/// non-browser clients.
pub struct OriginGuard {
    allowed: Vec<String>,
}

impl OriginGuard {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GateDenial> {
        match headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
        {
            None => Ok(()),
            Some(origin) if self.allowed.iter().any(|allowed| allowed == origin) => Ok(()),
            Some(_) => Err(GateDenial {
                status: StatusCode::FORBIDDEN,
                message: "Origin not allowed",
            }),
        }
    }
}
