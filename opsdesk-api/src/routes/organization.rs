/// Organization and membership endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/organization/create`
/// - `POST /api/v1/organization/add-member` (ADMIN in the target org)
/// - `POST /api/v1/organization/get-user-orgs`
/// - `POST /api/v1/organization/change-user-role` (ADMIN in the target org)
///
/// Role-guarded endpoints consult the access gate, which reads the acting
/// user's role from the database at request time.

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use opsdesk_shared::{
    auth::gate,
    models::{
        membership::{CreateMembership, Membership, OrgRole},
        organization::Organization,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create organization request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrgRequest {
    /// Organization name, unique across the system
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

/// Create organization response
#[derive(Debug, Serialize)]
pub struct CreateOrgResponse {
    pub success: bool,

    #[serde(rename = "newOrg")]
    pub new_org: Organization,

    pub message: String,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub org_id: Uuid,

    /// Defaults to MEMBER when omitted
    #[serde(default = "default_member_role")]
    pub role: OrgRole,
}

fn default_member_role() -> OrgRole {
    OrgRole::Member
}

/// Add member response
#[derive(Debug, Serialize)]
pub struct AddMemberResponse {
    pub success: bool,

    #[serde(rename = "newMember")]
    pub new_member: Membership,

    pub message: String,
}

/// List organizations request
#[derive(Debug, Deserialize)]
pub struct GetUserOrgsRequest {
    pub user_id: Uuid,
}

/// List organizations response
#[derive(Debug, Serialize)]
pub struct GetUserOrgsResponse {
    pub success: bool,
    pub orgs: Vec<Organization>,
    pub message: String,
}

/// Change role request
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: OrgRole,
}

/// Change role response
#[derive(Debug, Serialize)]
pub struct ChangeRoleResponse {
    pub success: bool,

    #[serde(rename = "updatedRole")]
    pub updated_role: Membership,

    pub message: String,
}

/// Creates an organization
///
/// Any authenticated user may create one; duplicate names return 409. The
/// creator becomes the organization's first ADMIN in the same transaction,
/// so add-member and change-user-role are usable immediately.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateOrgRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let org = Organization::create(&state.db, &payload.name, auth.user_id).await?;

    tracing::info!(org_id = %org.id, created_by = %auth.user_id, "Organization created");

    Ok((
        StatusCode::CREATED,
        Json(CreateOrgResponse {
            success: true,
            new_org: org,
            message: "Organization created successfully".to_string(),
        }),
    ))
}

/// Adds a user to an organization with a role
///
/// The acting user must hold ADMIN in the target organization. An existing
/// membership for the pair returns 409.
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<impl IntoResponse> {
    gate::require_org_role(&state.db, payload.org_id, auth.user_id, OrgRole::Admin).await?;

    let membership = Membership::create(
        &state.db,
        CreateMembership {
            org_id: payload.org_id,
            user_id: payload.user_id,
            role: payload.role,
        },
    )
    .await?;

    tracing::info!(
        org_id = %payload.org_id,
        user_id = %payload.user_id,
        role = membership.role.as_str(),
        "Member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddMemberResponse {
            success: true,
            new_member: membership,
            message: "Member added successfully".to_string(),
        }),
    ))
}

/// Lists the organizations a user belongs to
///
/// Returns 404 when the user has no memberships.
pub async fn get_user_orgs(
    State(state): State<AppState>,
    Json(payload): Json<GetUserOrgsRequest>,
) -> ApiResult<Json<GetUserOrgsResponse>> {
    let orgs = Organization::list_for_user(&state.db, payload.user_id).await?;

    if orgs.is_empty() {
        return Err(ApiError::NotFound(
            "No organizations found for this user".to_string(),
        ));
    }

    Ok(Json(GetUserOrgsResponse {
        success: true,
        orgs,
        message: "Organizations retrieved successfully".to_string(),
    }))
}

/// Changes a user's role within an organization
///
/// The acting user must hold ADMIN in the organization and cannot change
/// their own role. Last write wins for this field.
pub async fn change_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ChangeRoleResponse>> {
    if payload.user_id == auth.user_id {
        return Err(ApiError::Forbidden(
            "Cannot change your own role".to_string(),
        ));
    }

    gate::require_org_role(&state.db, payload.org_id, auth.user_id, OrgRole::Admin).await?;

    let membership =
        Membership::update_role(&state.db, payload.org_id, payload.user_id, payload.role)
            .await?
            .ok_or_else(|| ApiError::NotFound("Membership not found".to_string()))?;

    tracing::info!(
        org_id = %payload.org_id,
        user_id = %payload.user_id,
        role = membership.role.as_str(),
        "Role changed"
    );

    Ok(Json(ChangeRoleResponse {
        success: true,
        updated_role: membership,
        message: "Role updated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_member_default_role() {
        let payload: AddMemberRequest = serde_json::from_str(
            r#"{"user_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11",
                "org_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f12"}"#,
        )
        .unwrap();
        assert_eq!(payload.role, OrgRole::Member);
    }

    #[test]
    fn test_change_role_rejects_unknown_role() {
        let result = serde_json::from_str::<ChangeRoleRequest>(
            r#"{"user_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11",
                "org_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f12",
                "role":"OWNER"}"#,
        );
        assert!(result.is_err());
    }
}
