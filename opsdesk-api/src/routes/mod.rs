/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness and database connectivity
/// - `auth`: register, login, logout, token refresh
/// - `organization`: organizations and memberships
/// - `ticket`: ticket lifecycle and message history

pub mod auth;
pub mod health;
pub mod organization;
pub mod ticket;
