/// Access control gate
///
/// Every organization- or ticket-scoped operation passes through here
/// before touching data. The gate answers one question: does this user
/// hold the required role in the organization that owns the target?
///
/// Two properties are deliberate and load-bearing:
///
/// - **Exact-match roles.** A required role is satisfied only by that
///   role. ADMIN does not imply AGENT; there is no hierarchy.
///   See [`OrgRole::satisfies`].
/// - **Fresh role resolution.** The role comes from the membership table
///   at check time, never from the token's role snapshot, so demotions
///   and promotions apply to the very next request.
///
/// For ticket-scoped checks the ticket lookup and the role lookup happen
/// inside a single transaction, so the pair is read from one consistent
/// snapshot even while memberships or tickets are being mutated
/// concurrently.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::membership::OrgRole;
use crate::models::ticket::Ticket;

/// Error type for gate checks
///
/// Variants map one-to-one onto the API's error taxonomy: missing targets
/// become 404, membership and role failures become 403.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The target ticket does not exist
    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    /// The user holds no membership in the owning organization
    #[error("User {user_id} is not a member of organization {org_id}")]
    NotMember { user_id: Uuid, org_id: Uuid },

    /// The user is a member but holds the wrong role
    #[error("Operation requires the {required} role", required = .required.as_str())]
    RoleMismatch {
        required: OrgRole,
        actual: OrgRole,
    },

    /// Database failure during the check
    #[error("Database error during access check: {0}")]
    Database(#[from] sqlx::Error),
}

/// Requires `user_id` to hold exactly `required` in `org_id`
///
/// Returns the user's role on success so callers can log it.
///
/// # Errors
///
/// - [`GateError::NotMember`] when no membership row exists
/// - [`GateError::RoleMismatch`] when the held role differs from `required`
pub async fn require_org_role(
    pool: &PgPool,
    org_id: Uuid,
    user_id: Uuid,
    required: OrgRole,
) -> Result<OrgRole, GateError> {
    let actual: Option<OrgRole> =
        sqlx::query_scalar("SELECT role FROM memberships WHERE org_id = $1 AND user_id = $2")
            .bind(org_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    let actual = actual.ok_or(GateError::NotMember { user_id, org_id })?;

    if !actual.satisfies(required) {
        return Err(GateError::RoleMismatch { required, actual });
    }

    Ok(actual)
}

/// Requires `user_id` to hold exactly `required` in the organization that
/// owns `ticket_id`
///
/// Resolves the ticket to its organization, then the user's role in that
/// organization, both inside one transaction. Returns the ticket so
/// handlers avoid a second lookup.
///
/// # Errors
///
/// - [`GateError::TicketNotFound`] when the ticket is absent
/// - [`GateError::NotMember`] / [`GateError::RoleMismatch`] as for
///   [`require_org_role`]
pub async fn require_ticket_role(
    pool: &PgPool,
    ticket_id: Uuid,
    user_id: Uuid,
    required: OrgRole,
) -> Result<Ticket, GateError> {
    let mut tx = pool.begin().await?;

    let ticket = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, title, description, org_id, status, priority,
               created_by, assigned_to, created_at, updated_at
        FROM tickets
        WHERE id = $1
        "#,
    )
    .bind(ticket_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(ticket) = ticket else {
        tx.rollback().await?;
        return Err(GateError::TicketNotFound(ticket_id));
    };

    let actual: Option<OrgRole> =
        sqlx::query_scalar("SELECT role FROM memberships WHERE org_id = $1 AND user_id = $2")
            .bind(ticket.org_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    tx.commit().await?;

    let actual = actual.ok_or(GateError::NotMember {
        user_id,
        org_id: ticket.org_id,
    })?;

    if !actual.satisfies(required) {
        return Err(GateError::RoleMismatch { required, actual });
    }

    Ok(ticket)
}
