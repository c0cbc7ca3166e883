/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use opsdesk_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = opsdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use opsdesk_shared::{auth::jwt, models::membership::OrgRole};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; the config is behind an
/// `Arc` and the pool is internally reference-counted, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// JWT signing secret as bytes
    pub fn jwt_secret(&self) -> &[u8] {
        self.config.jwt.secret.as_bytes()
    }
}

/// Identity of the authenticated caller, injected into request extensions
/// by [`jwt_auth_layer`]
///
/// `role_snapshot` is the role stamped into the token at issuance. It is
/// never consulted for authorization; the gate re-reads the membership
/// table on every check.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user's ID
    pub user_id: Uuid,

    /// Role claim carried by the token, informational only
    pub role_snapshot: Option<OrgRole>,
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                           # liveness + DB check (public)
/// └── /api/v1/
///     ├── /auth/                        # public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   └── POST /refresh
///     ├── /organization/                # bearer token required
///     │   ├── POST /create
///     │   ├── POST /add-member          # ADMIN in target org
///     │   ├── POST /get-user-orgs
///     │   └── POST /change-user-role    # ADMIN in target org
///     └── /ticket/                      # bearer token required
///         ├── POST /create
///         ├── POST /get-tickets
///         ├── POST /assign-ticket       # ADMIN in owning org
///         ├── POST /update-ticket-status # ADMIN
///         ├── POST /update-ticket       # ADMIN
///         ├── POST /delete-ticket       # ADMIN
///         ├── POST /add-ticket-message  # AGENT
///         └── POST /get-ticket-message  # AGENT
/// ```
///
/// Role requirements are enforced inside handlers through the access gate,
/// which resolves roles from the database; the router-level layer only
/// authenticates.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh));

    let organization_routes = Router::new()
        .route("/create", post(routes::organization::create))
        .route("/add-member", post(routes::organization::add_member))
        .route("/get-user-orgs", post(routes::organization::get_user_orgs))
        .route(
            "/change-user-role",
            post(routes::organization::change_user_role),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let ticket_routes = Router::new()
        .route("/create", post(routes::ticket::create))
        .route("/get-tickets", post(routes::ticket::get_tickets))
        .route("/assign-ticket", post(routes::ticket::assign_ticket))
        .route(
            "/update-ticket-status",
            post(routes::ticket::update_ticket_status),
        )
        .route("/update-ticket", post(routes::ticket::update_ticket))
        .route("/delete-ticket", post(routes::ticket::delete_ticket))
        .route(
            "/add-ticket-message",
            post(routes::ticket::add_ticket_message),
        )
        .route(
            "/get-ticket-message",
            post(routes::ticket::get_ticket_message),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/organization", organization_routes)
        .nest("/ticket", ticket_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        // Credentials must be allowed for the refresh cookie to travel
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer token authentication layer
///
/// Validates the access token from the Authorization header and injects an
/// [`AuthContext`] into request extensions. Refresh tokens are rejected
/// here; they are only accepted by the refresh endpoint via the cookie.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        role_snapshot: claims.role,
    });

    Ok(next.run(req).await)
}
