/// Authentication and authorization for OpsDesk
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: bearer credential generation and validation (HS256)
/// - [`gate`]: the access control gate consulted before every mutating
///   organization or ticket operation
///
/// # Security notes
///
/// - Passwords are hashed with Argon2id; plaintext never persists and is
///   never logged.
/// - Access tokens are short-lived (15 minutes); refresh tokens (7 days)
///   travel only in an HttpOnly cookie.
/// - The gate resolves the acting user's role from the membership table on
///   every check rather than trusting the role claim baked into the token,
///   so role changes take effect immediately for authorization.

pub mod gate;
pub mod jwt;
pub mod password;
