/// Ticket history ledger
///
/// Append-only audit trail of ticket status transitions. Entries are never
/// updated; the only delete path is the cascade inside
/// [`Ticket::delete`](super::ticket::Ticket::delete).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ticket_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     ticket_id UUID NOT NULL REFERENCES tickets(id),
///     new_status ticket_status NOT NULL,
///     changed_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::ticket::TicketStatus;

/// One journaled status transition
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    /// Unique entry ID (UUID v4)
    pub id: Uuid,

    /// Ticket this entry belongs to
    pub ticket_id: Uuid,

    /// Status the ticket moved to
    pub new_status: TicketStatus,

    /// User who made the change
    pub changed_by: Uuid,

    /// Insertion time; entries are ordered by this
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Appends one entry to a ticket's ledger
    ///
    /// Generic over the executor so callers can append on the pool or
    /// inside an open transaction. `Ticket::update_status` passes its
    /// transaction here to keep the status write and the journal entry
    /// atomic.
    pub async fn append<'e, E>(
        executor: E,
        ticket_id: Uuid,
        new_status: TicketStatus,
        changed_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO ticket_history (ticket_id, new_status, changed_by)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, new_status, changed_by, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(new_status)
        .bind(changed_by)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }

    /// Lists a ticket's entries in insertion order
    ///
    /// Empty when the ticket has no history (or does not exist); callers
    /// decide whether that is a NotFound.
    pub async fn list(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, ticket_id, new_status, changed_by, created_at
            FROM ticket_history
            WHERE ticket_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}
