/// Error handling for the API server
///
/// Handlers return `Result<T, ApiError>`; the error converts into an HTTP
/// response carrying the standard envelope:
///
/// ```json
/// { "success": false, "message": "Ticket not found" }
/// ```
///
/// Every failure path, including validation and internal errors, uses this
/// shape so clients parse one format.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use opsdesk_shared::auth::{gate::GateError, jwt::JwtError, password::PasswordError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): malformed or missing input
    BadRequest(String),

    /// Validation failure (400) with per-field details
    Validation(Vec<ValidationErrorDetail>),

    /// Unauthenticated (401): absent, expired, or malformed credentials
    Unauthorized(String),

    /// Forbidden (403): authenticated but lacking the required role
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409): duplicate email, organization name, or membership
    Conflict(String),

    /// Internal server error (500); details are logged, never sent
    Internal(String),
}

/// One field that failed validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field name
    pub field: String,

    /// Human-readable message
    pub message: String,
}

/// The error half of the response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false` on error paths
    pub success: bool,

    /// Human-readable error message
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} field(s)", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Validation(errors) => {
                let message = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                // Log the detail, return a generic message
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorEnvelope {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

/// Maps database errors onto the taxonomy
///
/// Unique violations become 409 with a resource-specific message; foreign
/// key violations mean the request referenced a row that does not exist and
/// become 404; row lookups that handlers did not guard also become 404.
/// Everything else is a 500. Constraint names stay server-side.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or("");
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already in use".to_string());
                    }
                    if constraint.contains("organizations_name") {
                        return ApiError::Conflict(
                            "Organization name already exists".to_string(),
                        );
                    }
                    if constraint.contains("memberships_pkey") {
                        return ApiError::Conflict(
                            "User is already a member of this organization".to_string(),
                        );
                    }
                    return ApiError::Conflict("Resource already exists".to_string());
                }

                if db_err.is_foreign_key_violation() {
                    return ApiError::NotFound(
                        "Referenced resource does not exist".to_string(),
                    );
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Gate failures carry their own taxonomy: missing targets are 404,
/// membership and role failures are 403.
impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::TicketNotFound(_) => ApiError::NotFound("Ticket not found".to_string()),
            GateError::NotMember { .. } => {
                ApiError::Forbidden("Not a member of this organization".to_string())
            }
            GateError::RoleMismatch { required, .. } => ApiError::Forbidden(format!(
                "Operation requires the {} role",
                required.as_str()
            )),
            GateError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "invalid value".to_string()),
                })
            })
            .collect();

        ApiError::Validation(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ApiError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ApiError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gate_errors_map_to_taxonomy() {
        use opsdesk_shared::models::membership::OrgRole;
        use uuid::Uuid;

        let not_found = GateError::TicketNotFound(Uuid::new_v4());
        assert_eq!(status_of(not_found.into()), StatusCode::NOT_FOUND);

        let not_member = GateError::NotMember {
            user_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
        };
        assert_eq!(status_of(not_member.into()), StatusCode::FORBIDDEN);

        let mismatch = GateError::RoleMismatch {
            required: OrgRole::Admin,
            actual: OrgRole::Agent,
        };
        let err: ApiError = mismatch.into();
        assert!(matches!(&err, ApiError::Forbidden(msg) if msg.contains("ADMIN")));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("connection refused at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The body must not leak the detail; it is only logged
    }
}
