/// Membership model and database operations
///
/// A membership binds a user to an organization with exactly one role. This
/// is the data the access gate consults on every authorized request.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE org_role AS ENUM ('ADMIN', 'AGENT', 'MEMBER');
///
/// CREATE TABLE memberships (
///     org_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role org_role NOT NULL DEFAULT 'MEMBER',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (org_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **ADMIN**: membership management, ticket assignment/status/update/delete
/// - **AGENT**: ticket message (history) operations
/// - **MEMBER**: baseline membership, ticket creation and listing
///
/// Role checks are **exact-match**: ADMIN does not satisfy an
/// AGENT-required operation. There is no hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user within one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "org_role")]
pub enum OrgRole {
    /// Manages members and performs all ticket mutations
    #[sqlx(rename = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,

    /// Works the ticket message/history surface
    #[sqlx(rename = "AGENT")]
    #[serde(rename = "AGENT")]
    Agent,

    /// Plain member
    #[sqlx(rename = "MEMBER")]
    #[serde(rename = "MEMBER")]
    Member,
}

impl OrgRole {
    /// Wire representation, matching the database enum labels
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Admin => "ADMIN",
            OrgRole::Agent => "AGENT",
            OrgRole::Member => "MEMBER",
        }
    }

    /// Whether this role satisfies a required role
    ///
    /// Exact-match semantics: a role satisfies only itself. ADMIN attempting
    /// an AGENT-required operation is rejected.
    pub fn satisfies(&self, required: OrgRole) -> bool {
        *self == required
    }
}

/// A user's role binding within one organization
///
/// Invariant: at most one row per (org, user) pair, enforced by the
/// composite primary key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Organization ID
    pub org_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: OrgRole,

    /// When the user joined
    pub created_at: DateTime<Utc>,
}

/// Input for adding a user to an organization
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembership {
    /// Organization ID
    pub org_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to MEMBER)
    #[serde(default = "default_role")]
    pub role: OrgRole,
}

fn default_role() -> OrgRole {
    OrgRole::Member
}

impl Membership {
    /// Adds a user to an organization with a role
    ///
    /// # Errors
    ///
    /// Returns a database error if the pair already exists (primary key
    /// violation, surfaced by the API layer as AlreadyMember) or a
    /// referenced user/organization is absent (foreign key violation).
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (org_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING org_id, user_id, role, created_at
            "#,
        )
        .bind(data.org_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the membership for a (org, user) pair, `None` if absent
    pub async fn find(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT org_id, user_id, role, created_at
            FROM memberships
            WHERE org_id = $1 AND user_id = $2
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Looks up a user's role within an organization
    ///
    /// `None` means the user is not a member.
    pub async fn get_role(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrgRole>, sqlx::Error> {
        let role: Option<OrgRole> = sqlx::query_scalar(
            "SELECT role FROM memberships WHERE org_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Looks up the role of a user's earliest membership, if any
    ///
    /// Used at login to stamp a role snapshot into the token. The snapshot
    /// is informational; authorization re-reads the role on every check.
    pub async fn first_role_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<OrgRole>, sqlx::Error> {
        let role: Option<OrgRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM memberships
            WHERE user_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Changes a user's role within an organization
    ///
    /// Last write wins for this field. Returns the updated membership, or
    /// `None` if the membership does not exist.
    pub async fn update_role(
        pool: &PgPool,
        org_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE org_id = $1 AND user_id = $2
            RETURNING org_id, user_id, role, created_at
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(OrgRole::Admin.as_str(), "ADMIN");
        assert_eq!(OrgRole::Agent.as_str(), "AGENT");
        assert_eq!(OrgRole::Member.as_str(), "MEMBER");
    }

    #[test]
    fn test_role_exact_match_no_hierarchy() {
        // Each role satisfies only itself
        assert!(OrgRole::Admin.satisfies(OrgRole::Admin));
        assert!(OrgRole::Agent.satisfies(OrgRole::Agent));
        assert!(OrgRole::Member.satisfies(OrgRole::Member));

        // ADMIN does not imply AGENT and vice versa
        assert!(!OrgRole::Admin.satisfies(OrgRole::Agent));
        assert!(!OrgRole::Agent.satisfies(OrgRole::Admin));
        assert!(!OrgRole::Admin.satisfies(OrgRole::Member));
        assert!(!OrgRole::Member.satisfies(OrgRole::Agent));
    }

    #[test]
    fn test_role_serde_wire_format() {
        assert_eq!(serde_json::to_string(&OrgRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<OrgRole>("\"AGENT\"").unwrap(),
            OrgRole::Agent
        );
        assert!(serde_json::from_str::<OrgRole>("\"SUPERUSER\"").is_err());
    }

    #[test]
    fn test_create_membership_default_role() {
        let data: CreateMembership = serde_json::from_str(
            r#"{"org_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11",
                "user_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f12"}"#,
        )
        .unwrap();
        assert_eq!(data.role, OrgRole::Member);
    }
}
