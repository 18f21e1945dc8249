use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::entity::user::Role;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Name of the cookie the session token travels in.
pub const SESSION_COOKIE: &str = "accessToken";

/// Verified identity of the caller.
///
/// Resolved from the `accessToken` session cookie, or from an
/// `Authorization: Bearer <token>` header carrying the same token. When both
/// are present the cookie is tried first and the header is the fallback. Add it as a
/// handler parameter to require a session; role checks happen via
/// [`AuthContext::require_role`] in the handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthContext {
    /// Returns `Ok(())` if the caller holds `role`, `Err(PermissionDenied)` otherwise.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Owners manage their own files; admins manage everyone's.
    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.role == Role::Admin || self.user_id == owner_id
    }
}

/// Candidate session tokens in the order they are tried: the cookie first,
/// then the `Authorization: Bearer` header.
fn session_tokens(parts: &Parts) -> Result<Vec<String>, AppError> {
    let mut tokens = Vec::new();

    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        tokens.push(cookie.value().to_string());
    }

    match parts
        .headers
        .get("Authorization")
        .map(|v| v.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")))
    {
        Some(Some(bearer)) => tokens.push(bearer.to_string()),
        Some(None) if tokens.is_empty() => return Err(AppError::TokenInvalid),
        Some(None) | None => {}
    }

    if tokens.is_empty() {
        return Err(AppError::TokenMissing);
    }
    Ok(tokens)
}

/// The claims of the first candidate token that verifies. A stale cookie does
/// not shadow a valid bearer token.
fn resolve_claims(parts: &Parts, secret: &str) -> Result<jwt::Claims, AppError> {
    session_tokens(parts)?
        .iter()
        .find_map(|token| jwt::verify(token, secret).ok())
        .ok_or(AppError::TokenInvalid)
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = resolve_claims(parts, &state.config.auth.jwt_secret)?;

        Ok(AuthContext {
            user_id: claims.uid,
            email: claims.sub,
            role: claims.role,
        })
    }
}
