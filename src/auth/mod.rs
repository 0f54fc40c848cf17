pub mod jwt;
pub mod password;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

use crate::{error::AppError, state::AppState};

/// The resolved actor behind a bearer token. Verification is stateless:
/// signature and expiry only, no session-table lookup, so a revoked token
/// stays accepted until it expires.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub role_id: i32,
    pub role: String,
    /// The literal token presented, kept so logout can revoke it.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|err| {
                    if err.is_missing() {
                        AppError::bad_request("authorization header is missing")
                    } else {
                        AppError::bad_request("invalid authorization header format")
                    }
                })?;

        let token = bearer.token();
        if token.is_empty() {
            return Err(AppError::bad_request(
                "token is missing in authorization header",
            ));
        }

        let claims = state.jwt.verify_token(token).map_err(|err| {
            if matches!(err.kind(), JwtErrorKind::ExpiredSignature) {
                AppError::unauthorized("token expired")
            } else {
                AppError::unauthorized("invalid token")
            }
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role_id: claims.role_id,
            role: claims.role,
            token: token.to_owned(),
        })
    }
}
