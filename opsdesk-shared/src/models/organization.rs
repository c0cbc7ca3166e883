/// Organization model and database operations
///
/// Organizations are the tenancy boundary: every ticket belongs to exactly
/// one organization, and users gain access through memberships.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// An organization owning memberships and tickets
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// Organization name, unique across the system
    pub name: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization with the creator as its first ADMIN
    ///
    /// The organization row and the creator's ADMIN membership commit in one
    /// transaction, so every organization has an administrator from the
    /// moment it exists and member management can proceed through the
    /// normal role-guarded paths.
    ///
    /// # Errors
    ///
    /// Returns a database error if the name is already taken (unique
    /// constraint), the creator does not exist (foreign key), or the
    /// connection fails.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        creator_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO memberships (org_id, user_id, role) VALUES ($1, $2, 'ADMIN')")
            .bind(org.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(org)
    }

    /// Finds an organization by ID, `None` if absent
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(org)
    }

    /// Lists the organizations a user is a member of
    ///
    /// Ordered by when the user joined. Empty when the user has no
    /// memberships; callers decide whether that is a NotFound.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let orgs = sqlx::query_as::<_, Organization>(
            r#"
            SELECT o.id, o.name, o.created_at
            FROM organizations o
            JOIN memberships m ON m.org_id = o.id
            WHERE m.user_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(orgs)
    }
}
