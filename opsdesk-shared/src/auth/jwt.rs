/// JWT generation and validation (HS256)
///
/// Two token kinds circulate:
///
/// - **Access** tokens (15 minutes) travel as `Authorization: Bearer ...`
///   and authenticate every API request.
/// - **Refresh** tokens (7 days) travel only in the HttpOnly `refreshToken`
///   cookie and can be exchanged for a fresh access token.
///
/// Claims carry the user ID and a snapshot of a role at issuance time. The
/// snapshot is informational only; authorization always re-resolves the
/// role from the membership table (see [`gate`](super::gate)).
///
/// # Example
///
/// ```no_run
/// use opsdesk_shared::auth::jwt::{create_token, validate_access_token, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = b"at-least-32-bytes-of-signing-secret";
/// let token = create_token(Uuid::new_v4(), None, TokenType::Access, secret)?;
/// let claims = validate_access_token(&token, secret)?;
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::membership::OrgRole;

/// Token issuer baked into every credential
pub const ISSUER: &str = "opsdesk";

/// Access token lifetime in minutes
pub const ACCESS_TOKEN_MINUTES: i64 = 15;

/// Refresh token lifetime in days
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Token failed signature or claim validation
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// Token is valid but of the wrong kind for this operation
    #[error("Expected a {expected:?} token, got {actual:?}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
}

/// Discriminates access tokens from refresh tokens
///
/// Kept in the claims so a refresh token can never be replayed as an access
/// token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's ID
    pub sub: Uuid,

    /// Role snapshot at issuance; `None` when the user had no org context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<OrgRole>,

    /// Issuer, always [`ISSUER`]
    pub iss: String,

    /// Issued-at (unix seconds)
    pub iat: i64,

    /// Expiry (unix seconds)
    pub exp: i64,

    /// Not-before (unix seconds)
    pub nbf: i64,

    /// Access or refresh
    pub token_type: TokenType,
}

/// Creates a signed token for a user
///
/// Lifetime is 15 minutes for [`TokenType::Access`] and 7 days for
/// [`TokenType::Refresh`].
pub fn create_token(
    user_id: Uuid,
    role: Option<OrgRole>,
    token_type: TokenType,
    secret: &[u8],
) -> Result<String, JwtError> {
    let now = Utc::now();
    let lifetime = match token_type {
        TokenType::Access => Duration::minutes(ACCESS_TOKEN_MINUTES),
        TokenType::Refresh => Duration::days(REFRESH_TOKEN_DAYS),
    };

    let claims = Claims {
        sub: user_id,
        role,
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        nbf: now.timestamp(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(token)
}

/// Validates a token's signature, expiry, not-before, and issuer
///
/// Does not check the token kind; prefer [`validate_access_token`] or
/// [`validate_refresh_token`] at call sites that care.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;

    Ok(data.claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Access,
            actual: claims.token_type,
        });
    }
    Ok(claims)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongTokenType {
            expected: TokenType::Refresh,
            actual: claims.token_type,
        });
    }
    Ok(claims)
}

/// Exchanges a valid refresh token for a new access token
///
/// The role snapshot is carried over unchanged; it is refreshed only on a
/// full login.
pub fn refresh_access_token(refresh_token: &str, secret: &[u8]) -> Result<String, JwtError> {
    let claims = validate_refresh_token(refresh_token, secret)?;
    create_token(claims.sub, claims.role, TokenType::Access, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-that-is-long-enough-to-sign";

    #[test]
    fn test_access_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token =
            create_token(user_id, Some(OrgRole::Admin), TokenType::Access, SECRET).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Some(OrgRole::Admin));
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_MINUTES * 60);
    }

    #[test]
    fn test_refresh_token_lifetime() {
        let token = create_token(Uuid::new_v4(), None, TokenType::Refresh, SECRET).unwrap();
        let claims = validate_refresh_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(Uuid::new_v4(), None, TokenType::Access, SECRET).unwrap();
        assert!(validate_token(&token, b"a-different-signing-secret").is_err());
    }

    #[test]
    fn test_token_kinds_not_interchangeable() {
        let refresh = create_token(Uuid::new_v4(), None, TokenType::Refresh, SECRET).unwrap();
        let err = validate_access_token(&refresh, SECRET).unwrap_err();
        assert!(matches!(err, JwtError::WrongTokenType { .. }));

        let access = create_token(Uuid::new_v4(), None, TokenType::Access, SECRET).unwrap();
        assert!(validate_refresh_token(&access, SECRET).is_err());
    }

    #[test]
    fn test_refresh_produces_usable_access_token() {
        let user_id = Uuid::new_v4();
        let refresh =
            create_token(user_id, Some(OrgRole::Agent), TokenType::Refresh, SECRET).unwrap();
        let access = refresh_access_token(&refresh, SECRET).unwrap();
        let claims = validate_access_token(&access, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Some(OrgRole::Agent));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}
