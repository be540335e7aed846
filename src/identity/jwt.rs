use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Identity, IdentityVerifier, VerifyError};
use crate::config::SecurityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    /// Everything else the provider put in the token (iss, aud, name, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(subject: impl Into<String>, email: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: subject.into(),
            email: Some(email.into()),
            exp,
            iat: now.timestamp(),
            extra: Map::new(),
        }
    }
}

impl TryFrom<Claims> for Identity {
    type Error = VerifyError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| VerifyError::InvalidToken("token carries no email claim".to_string()))?;

        let mut all = claims.extra;
        all.insert("sub".to_string(), Value::String(claims.sub.clone()));
        all.insert("email".to_string(), Value::String(email.clone()));
        all.insert("exp".to_string(), Value::from(claims.exp));
        all.insert("iat".to_string(), Value::from(claims.iat));

        Ok(Identity {
            subject_id: claims.sub,
            email,
            claims: all,
        })
    }
}

/// Verifies provider-issued JWTs, HS256 with a shared secret or RS256 with a public key.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, VerifyError> {
        let (decoding_key, algorithm) = match security.jwt_public_key_pem.as_deref() {
            Some(pem) => {
                let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| VerifyError::Misconfigured(format!("invalid RSA public key: {}", e)))?;
                (key, Algorithm::RS256)
            }
            None => {
                if security.jwt_secret.is_empty() {
                    return Err(VerifyError::Misconfigured("JWT secret not configured".to_string()));
                }
                (DecodingKey::from_secret(security.jwt_secret.as_bytes()), Algorithm::HS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        match security.jwt_issuer.as_deref() {
            Some(iss) => validation.set_issuer(&[iss]),
            None => validation.iss = None,
        }
        match security.jwt_audience.as_deref() {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, VerifyError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| VerifyError::InvalidToken(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        if token.trim().is_empty() {
            return Err(VerifyError::InvalidToken("empty token".to_string()));
        }
        let claims = self.decode_claims(token)?;
        Identity::try_from(claims)
    }
}

#[derive(Debug)]
pub enum TokenError {
    Generation(String),
    InvalidSecret,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Generation(msg) => write!(f, "JWT generation error: {}", msg),
            TokenError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Mints HS256 tokens for local development and tests.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    expiry_hours: u64,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenIssuer {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        if security.jwt_secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            expiry_hours: security.jwt_expiry_hours,
            issuer: security.jwt_issuer.clone(),
            audience: security.jwt_audience.clone(),
        })
    }

    pub fn issue(&self, subject: &str, email: &str) -> Result<String, TokenError> {
        let mut claims = Claims::new(subject, email, self.expiry_hours);
        if let Some(iss) = &self.issuer {
            claims.extra.insert("iss".to_string(), Value::String(iss.clone()));
        }
        if let Some(aud) = &self.audience {
            claims.extra.insert("aud".to_string(), Value::String(aud.clone()));
        }
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        AppConfig::for_environment(crate::config::Environment::Development).security
    }

    #[tokio::test]
    async fn accepts_token_from_matching_issuer() {
        let security = security();
        let token = TokenIssuer::from_config(&security)
            .unwrap()
            .issue("uid-1", "ana@example.com")
            .unwrap();

        let identity = JwtVerifier::from_config(&security).unwrap().verify(&token).await.unwrap();
        assert_eq!(identity.subject_id, "uid-1");
        assert_eq!(identity.email, "ana@example.com");
        assert_eq!(identity.claims.get("sub"), Some(&Value::String("uid-1".into())));
    }

    #[tokio::test]
    async fn rejects_token_signed_with_other_secret() {
        let mut other = security();
        other.jwt_secret = "someone-else".to_string();
        let token = TokenIssuer::from_config(&other).unwrap().issue("uid-1", "ana@example.com").unwrap();

        let err = JwtVerifier::from_config(&security()).unwrap().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let security = security();
        let issuer = TokenIssuer::from_config(&security).unwrap();
        let mut claims = Claims::new("uid-1", "ana@example.com", 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issuer.sign(&claims).unwrap();

        let err = JwtVerifier::from_config(&security).unwrap().verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_token_without_email() {
        let security = security();
        let issuer = TokenIssuer::from_config(&security).unwrap();
        let mut claims = Claims::new("uid-1", "", 1);
        claims.email = None;
        let token = issuer.sign(&claims).unwrap();

        let err = JwtVerifier::from_config(&security).unwrap().verify(&token).await.unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[tokio::test]
    async fn enforces_configured_audience() {
        let mut security = security();
        security.jwt_audience = Some("profile-api".to_string());
        let verifier = JwtVerifier::from_config(&security).unwrap();

        let good = TokenIssuer::from_config(&security).unwrap().issue("uid-1", "ana@example.com").unwrap();
        assert!(verifier.verify(&good).await.is_ok());

        let mut other = security.clone();
        other.jwt_audience = Some("another-app".to_string());
        let bad = TokenIssuer::from_config(&other).unwrap().issue("uid-1", "ana@example.com").unwrap();
        assert!(verifier.verify(&bad).await.is_err());
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let mut security = security();
        security.jwt_secret.clear();
        assert!(matches!(JwtVerifier::from_config(&security), Err(VerifyError::Misconfigured(_))));
        assert!(matches!(TokenIssuer::from_config(&security), Err(TokenError::InvalidSecret)));
    }

    #[tokio::test]
    async fn garbage_is_not_a_token() {
        let verifier = JwtVerifier::from_config(&security()).unwrap();
        assert!(verifier.verify("not.a.jwt").await.is_err());
        assert!(verifier.verify("   ").await.is_err());
    }
}
