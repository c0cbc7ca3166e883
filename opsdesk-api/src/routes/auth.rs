/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register`: create an account
/// - `POST /api/v1/auth/login`: issue tokens
/// - `POST /api/v1/auth/logout`: clear the refresh cookie
/// - `POST /api/v1/auth/refresh`: exchange the refresh cookie for a new
///   access token
///
/// Login returns the access token in the body and the refresh token only as
/// an `HttpOnly` cookie, so scripts on the client never see the long-lived
/// credential.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use opsdesk_shared::{
    auth::{
        jwt::{self, TokenType},
        password,
    },
    models::{
        membership::Membership,
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name of the refresh token cookie
const REFRESH_COOKIE: &str = "refreshToken";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address, unique across the system
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext password, hashed before storage
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,

    #[serde(rename = "newUser")]
    pub new_user: User,

    pub message: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response; the refresh token travels separately as a cookie
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,

    #[serde(rename = "accessToken")]
    pub access_token: String,

    pub message: String,
}

/// Logout / refresh responses share this shape
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,

    #[serde(rename = "accessToken")]
    pub access_token: String,

    pub message: String,
}

/// Registers a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// { "name": "Ada", "email": "ada@example.com", "password": "..." }
/// ```
///
/// Returns 201 with the created user (password hash omitted), 400 on
/// validation failure, 409 when the email is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let password_hash = password::hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: payload.name,
            email: payload.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            new_user: user,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Authenticates a user and issues tokens
///
/// The access token (15 minutes) is returned in the body; the refresh token
/// (7 days) is set as an `HttpOnly`, `Secure`, `SameSite=None` cookie.
/// Credential failures are deliberately indistinguishable: unknown email and
/// wrong password both return 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !password::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    // Role snapshot from the user's earliest membership; informational only
    let role = Membership::first_role_for_user(&state.db, user.id).await?;

    let access_token = jwt::create_token(user.id, role, TokenType::Access, state.jwt_secret())?;
    let refresh_token = jwt::create_token(user.id, role, TokenType::Refresh, state.jwt_secret())?;

    let cookie = Cookie::build((REFRESH_COOKIE, refresh_token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::days(jwt::REFRESH_TOKEN_DAYS))
        .build();

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            access_token,
            message: "Logged in successfully".to_string(),
        }),
    ))
}

/// Clears the refresh cookie
pub async fn logout(jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let removal = Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build();

    Ok((
        jar.remove(removal),
        Json(MessageResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Exchanges the refresh cookie for a new access token
///
/// Returns 401 when the cookie is absent, expired, or not a refresh token.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let access_token = jwt::refresh_access_token(&refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token,
        message: "Token refreshed".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_login_response_wire_keys() {
        let body = serde_json::to_value(LoginResponse {
            success: true,
            access_token: "tok".to_string(),
            message: "ok".to_string(),
        })
        .unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["accessToken"], "tok");
        assert!(body.get("access_token").is_none());
    }
}
