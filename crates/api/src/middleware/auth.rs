//! Bearer-token authentication.
//!
//! Tokens have the form `<user_id>.<role>.<signature>` where the signature is
//! the hex HMAC-SHA256 of `<user_id>.<role>` under the configured secret.
//! Provides extractors for requiring any caller or an admin in route handlers.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use stride_core::{Role, UserId};
use thiserror::Error;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Errors from minting or verifying a token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("invalid signing key: {0}")]
    Key(String),
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Signs and verifies bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenKey {
    secret: SecretString,
}

impl TokenKey {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Issue a token for `user_id` acting as `role`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Key` if the secret cannot key the MAC.
    pub fn mint(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        let payload = format!("{user_id}.{role}");
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Check a token's signature and decode the caller.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Malformed` for anything that does not parse and
    /// `TokenError::BadSignature` when the signature does not match.
    pub fn verify(&self, token: &str) -> Result<Caller, TokenError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (user, role) = payload.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let user_id = user.parse::<i32>().map_err(|_| TokenError::Malformed)?;
        let role = role.parse::<Role>().map_err(|_| TokenError::Malformed)?;
        Ok(Caller {
            user_id: UserId::new(user_id),
            role,
        })
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<Caller, AppError> {
    let token =
        bearer(parts).ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    let caller = state.tokens().verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized(e.to_string())
    })?;
    set_sentry_user(caller.user_id);
    Ok(caller)
}

/// Extractor that requires a valid token of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireUser(caller): RequireUser) -> impl IntoResponse {
///     format!("Orders of {}", caller.user_id)
/// }
/// ```
pub struct RequireUser(pub Caller);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Self)
    }
}

/// Extractor that requires an admin token.
///
/// Missing or invalid tokens get 401; valid non-admin tokens get 403.
pub struct RequireAdmin(pub Caller);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = authenticate(parts, state)?;
        if !caller.is_admin() {
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(Self(caller))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key() -> TokenKey {
        TokenKey::new(SecretString::from("k3Y-for-unit-tests-Zq81!xPw7#Lm2@Nv5"))
    }

    #[test]
    fn test_mint_then_verify() {
        let token = key().mint(UserId::new(42), Role::Admin).unwrap();
        assert!(token.starts_with("42.admin."));
        let caller = key().verify(&token).unwrap();
        assert_eq!(caller.user_id, UserId::new(42));
        assert!(caller.is_admin());
    }

    #[test]
    fn test_tampered_role_is_rejected() {
        let token = key().mint(UserId::new(42), Role::Customer).unwrap();
        let signature = token.rsplit_once('.').unwrap().1;
        let forged = format!("42.admin.{signature}");
        assert_eq!(key().verify(&forged).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn test_other_key_is_rejected() {
        let token = key().mint(UserId::new(1), Role::Customer).unwrap();
        let other = TokenKey::new(SecretString::from("another-Key_9f8e7d6c5b4a3!@#$%^&*()"));
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::BadSignature);
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "1.customer", "1.customer.zz", "x.customer.00"] {
            assert!(key().verify(token).is_err(), "{token}");
        }
    }

    #[test]
    fn test_bearer_header_parsing() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer 1.customer.abc")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(bearer(&parts), Some("1.customer.abc"));

        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Basic Zm9v")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(bearer(&parts), None);
    }
}
