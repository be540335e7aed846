//! Bearer-token identity verification.
//!
//! The API never inspects tokens itself; it hands them to an
//! [`IdentityVerifier`] and works with the resulting [`Identity`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod jwt;

pub use jwt::{Claims, JwtVerifier, TokenError, TokenIssuer};

/// Subject produced by a successful verification. Lives for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub subject_id: String,
    pub email: String,
    pub claims: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Verifier not configured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validate `token` and return the subject it was issued for.
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}
