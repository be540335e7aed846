use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;

/// Bearer-token gate for protected routes.
///
/// Verifies the token with the configured [`IdentityVerifier`] and inserts the
/// resulting [`Identity`] into the request extensions. Every failure answers
/// with the same 401 body; the reason only goes to the log.
///
/// [`IdentityVerifier`]: crate::identity::IdentityVerifier
/// [`Identity`]: crate::identity::Identity
pub async fn identity_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(|reason| {
        warn!("Rejected request to {}: {}", request.uri().path(), reason);
        ApiError::unauthorized()
    })?;

    let identity = state.verifier.verify(token).await.map_err(|e| {
        warn!("Rejected request to {}: {}", request.uri().path(), e);
        ApiError::unauthorized()
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must use Bearer token format")?;

    if token.trim().is_empty() {
        return Err("Empty bearer token");
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
        assert!(extract_bearer_token(&headers_with("Basic abc")).is_err());
        assert!(extract_bearer_token(&headers_with("bearer abc")).is_err());
        assert!(extract_bearer_token(&headers_with("Bearer ")).is_err());
        assert!(extract_bearer_token(&headers_with("Bearer    ")).is_err());
    }
}
