/// Database models for OpsDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `organization`: Organizations owning tickets and memberships
/// - `membership`: User-organization role bindings (RBAC)
/// - `ticket`: Support tickets and their lifecycle state machine
/// - `history`: Append-only ledger of ticket status transitions
///
/// # Example
///
/// ```no_run
/// use opsdesk_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod history;
pub mod membership;
pub mod organization;
pub mod ticket;
pub mod user;
