/// Ticket model and lifecycle operations
///
/// A ticket is a finite state machine owned by exactly one organization.
/// Status and priority are explicit database enums with validated
/// membership; free-text status values cannot enter the system.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE ticket_status AS ENUM ('OPEN', 'IN_PROGRESS', 'RESOLVED', 'CLOSED');
/// CREATE TYPE ticket_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tickets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     org_id UUID NOT NULL REFERENCES organizations(id),
///     status ticket_status NOT NULL DEFAULT 'OPEN',
///     priority ticket_priority NOT NULL DEFAULT 'MEDIUM',
///     created_by UUID NOT NULL REFERENCES users(id),
///     assigned_to UUID REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Invariants
///
/// - `org_id` never changes after creation; no update path touches it.
/// - Every status change appends a history entry in the same transaction.
/// - Deletion removes the ticket and its entire history atomically.
///
/// Transitions between any two states are allowed; lifecycle policy is
/// admin-driven rather than encoded as a transition table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::history::HistoryEntry;

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status")]
pub enum TicketStatus {
    /// Initial state for new tickets
    #[sqlx(rename = "OPEN")]
    #[serde(rename = "OPEN")]
    Open,

    /// An agent is working the ticket
    #[sqlx(rename = "IN_PROGRESS")]
    #[serde(rename = "IN_PROGRESS")]
    InProgress,

    /// Work finished, awaiting confirmation
    #[sqlx(rename = "RESOLVED")]
    #[serde(rename = "RESOLVED")]
    Resolved,

    /// Closed out
    #[sqlx(rename = "CLOSED")]
    #[serde(rename = "CLOSED")]
    Closed,
}

impl TicketStatus {
    /// Wire representation, matching the database enum labels
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
        }
    }
}

/// Urgency of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_priority")]
pub enum TicketPriority {
    #[sqlx(rename = "LOW")]
    #[serde(rename = "LOW")]
    Low,

    #[sqlx(rename = "MEDIUM")]
    #[serde(rename = "MEDIUM")]
    Medium,

    #[sqlx(rename = "HIGH")]
    #[serde(rename = "HIGH")]
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "LOW",
            TicketPriority::Medium => "MEDIUM",
            TicketPriority::High => "HIGH",
        }
    }
}

/// A support ticket
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    /// Unique ticket ID (UUID v4)
    pub id: Uuid,

    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Owning organization; immutable after creation
    pub org_id: Uuid,

    /// Current lifecycle state
    pub status: TicketStatus,

    /// Urgency
    pub priority: TicketPriority,

    /// User who opened the ticket; immutable after creation
    pub created_by: Uuid,

    /// User the ticket is assigned to, if any
    pub assigned_to: Option<Uuid>,

    /// When the ticket was created
    pub created_at: DateTime<Utc>,

    /// When the ticket was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a ticket
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicket {
    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Owning organization
    pub org_id: Uuid,

    /// Initial status (defaults to OPEN)
    #[serde(default = "default_status")]
    pub status: TicketStatus,

    /// Priority (defaults to MEDIUM)
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,

    /// User opening the ticket
    pub created_by: Uuid,
}

fn default_status() -> TicketStatus {
    TicketStatus::Open
}

fn default_priority() -> TicketPriority {
    TicketPriority::Medium
}

impl Ticket {
    /// Creates a new ticket in its owning organization
    ///
    /// # Errors
    ///
    /// Returns a database error if the organization or creator does not
    /// exist (foreign key violation) or the connection fails.
    pub async fn create(pool: &PgPool, data: CreateTicket) -> Result<Self, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (title, description, org_id, status, priority, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, org_id, status, priority,
                      created_by, assigned_to, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.org_id)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(ticket)
    }

    /// Finds a ticket by ID, `None` if absent
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, title, description, org_id, status, priority,
                   created_by, assigned_to, created_at, updated_at
            FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    /// Lists all tickets of an organization, newest first
    pub async fn list_by_org(pool: &PgPool, org_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, title, description, org_id, status, priority,
                   created_by, assigned_to, created_at, updated_at
            FROM tickets
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;

        Ok(tickets)
    }

    /// Assigns the ticket to a user
    ///
    /// Only `assigned_to` changes; `created_by` and `org_id` are immutable.
    /// Returns `None` if the ticket does not exist.
    pub async fn assign(
        pool: &PgPool,
        ticket_id: Uuid,
        assignee: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET assigned_to = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, org_id, status, priority,
                      created_by, assigned_to, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(assignee)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    /// Moves the ticket to a new status, journaling the transition
    ///
    /// The status write and the history append commit or roll back as one
    /// transaction; a history entry is never observable without its status
    /// change and vice versa.
    ///
    /// Returns the updated ticket and the appended entry, or `None` if the
    /// ticket does not exist (including deletion racing this call).
    pub async fn update_status(
        pool: &PgPool,
        ticket_id: Uuid,
        new_status: TicketStatus,
        changed_by: Uuid,
    ) -> Result<Option<(Self, HistoryEntry)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, org_id, status, priority,
                      created_by, assigned_to, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(new_status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(ticket) = ticket else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = HistoryEntry::append(&mut *tx, ticket.id, new_status, changed_by).await?;

        tx.commit().await?;
        Ok(Some((ticket, entry)))
    }

    /// Updates title and description
    ///
    /// Returns `None` if the ticket does not exist.
    pub async fn update_details(
        pool: &PgPool,
        ticket_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET title = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, org_id, status, priority,
                      created_by, assigned_to, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .bind(title)
        .bind(description)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    /// Deletes the ticket together with its entire history
    ///
    /// History rows are deleted first, then the ticket, inside one
    /// transaction. Failure at any step rolls back both deletes, so the
    /// ledger can never be orphaned and the ticket can never outlive a
    /// partial delete.
    ///
    /// Returns the deleted ticket, or `None` if it did not exist.
    pub async fn delete(pool: &PgPool, ticket_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM ticket_history WHERE ticket_id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            DELETE FROM tickets
            WHERE id = $1
            RETURNING id, title, description, org_id, status, priority,
                      created_by, assigned_to, created_at, updated_at
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?;

        match ticket {
            Some(ticket) => {
                tx.commit().await?;
                Ok(Some(ticket))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(TicketStatus::Open.as_str(), "OPEN");
        assert_eq!(TicketStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(TicketStatus::Resolved.as_str(), "RESOLVED");
        assert_eq!(TicketStatus::Closed.as_str(), "CLOSED");

        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::from_str::<TicketStatus>("\"RESOLVED\"").unwrap(),
            TicketStatus::Resolved
        );
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        // Status is a validated enum, not free text
        assert!(serde_json::from_str::<TicketStatus>("\"REOPENED\"").is_err());
        assert!(serde_json::from_str::<TicketStatus>("\"open\"").is_err());
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(TicketPriority::Low.as_str(), "LOW");
        assert_eq!(TicketPriority::Medium.as_str(), "MEDIUM");
        assert_eq!(TicketPriority::High.as_str(), "HIGH");
        assert!(serde_json::from_str::<TicketPriority>("\"URGENT\"").is_err());
    }

    #[test]
    fn test_create_ticket_defaults() {
        let data: CreateTicket = serde_json::from_str(
            r#"{"title":"Printer on fire",
                "description":"Third floor",
                "org_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11",
                "created_by":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f12"}"#,
        )
        .unwrap();
        assert_eq!(data.status, TicketStatus::Open);
        assert_eq!(data.priority, TicketPriority::Medium);
    }
}
