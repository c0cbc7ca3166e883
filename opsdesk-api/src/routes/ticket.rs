/// Ticket lifecycle and message history endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/ticket/create`
/// - `POST /api/v1/ticket/get-tickets`
/// - `POST /api/v1/ticket/assign-ticket` (ADMIN in the owning org)
/// - `POST /api/v1/ticket/update-ticket-status` (ADMIN)
/// - `POST /api/v1/ticket/update-ticket` (ADMIN)
/// - `POST /api/v1/ticket/delete-ticket` (ADMIN)
/// - `POST /api/v1/ticket/add-ticket-message` (AGENT)
/// - `POST /api/v1/ticket/get-ticket-message` (AGENT)
///
/// Guarded endpoints resolve the owning organization from the ticket and the
/// acting user's role from the database in one consistent read, then compare
/// exact-match against the required role.

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use opsdesk_shared::{
    auth::gate,
    models::{
        history::HistoryEntry,
        membership::OrgRole,
        ticket::{CreateTicket, Ticket, TicketPriority, TicketStatus},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create ticket request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub org_id: Uuid,

    /// Defaults to OPEN
    #[serde(default)]
    pub status: Option<TicketStatus>,

    /// Defaults to MEDIUM
    #[serde(default)]
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Serialize)]
pub struct CreateTicketResponse {
    pub success: bool,

    #[serde(rename = "newTicket")]
    pub new_ticket: Ticket,

    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GetTicketsRequest {
    pub org_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct GetTicketsResponse {
    pub success: bool,
    pub tickets: Vec<Ticket>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub user_id: Uuid,
    pub ticket_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AssignTicketResponse {
    pub success: bool,

    #[serde(rename = "assignedTicket")]
    pub assigned_ticket: Ticket,

    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub ticket_id: Uuid,
    pub status: TicketStatus,
}

#[derive(Debug, Serialize)]
pub struct UpdateTicketResponse {
    pub success: bool,

    #[serde(rename = "updatedTicket")]
    pub updated_ticket: Ticket,

    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTicketRequest {
    pub ticket_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTicketRequest {
    pub ticket_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeleteTicketResponse {
    pub success: bool,

    #[serde(rename = "deletedTicket")]
    pub deleted_ticket: Ticket,

    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub ticket_id: Uuid,
    pub new_status: TicketStatus,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AddMessageResponse {
    pub success: bool,

    #[serde(rename = "newMessage")]
    pub new_message: HistoryEntry,

    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GetMessagesRequest {
    pub ticket_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct GetMessagesResponse {
    pub success: bool,
    pub messages: Vec<HistoryEntry>,
    pub message: String,
}

/// Creates a ticket in an organization
///
/// Any authenticated user may open a ticket. Status defaults to OPEN and
/// priority to MEDIUM; the creator is taken from the token, never the body.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateTicketRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let ticket = Ticket::create(
        &state.db,
        CreateTicket {
            title: payload.title,
            description: payload.description,
            org_id: payload.org_id,
            status: payload.status.unwrap_or(TicketStatus::Open),
            priority: payload.priority.unwrap_or(TicketPriority::Medium),
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(ticket_id = %ticket.id, org_id = %ticket.org_id, "Ticket created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTicketResponse {
            success: true,
            new_ticket: ticket,
            message: "Ticket created successfully".to_string(),
        }),
    ))
}

/// Lists an organization's tickets, newest first
///
/// Returns 404 when the organization has no tickets.
pub async fn get_tickets(
    State(state): State<AppState>,
    Json(payload): Json<GetTicketsRequest>,
) -> ApiResult<Json<GetTicketsResponse>> {
    let tickets = Ticket::list_by_org(&state.db, payload.org_id).await?;

    if tickets.is_empty() {
        return Err(ApiError::NotFound(
            "No tickets found for this organization".to_string(),
        ));
    }

    Ok(Json(GetTicketsResponse {
        success: true,
        tickets,
        message: "Tickets retrieved successfully".to_string(),
    }))
}

/// Assigns a ticket to a user (ADMIN)
///
/// Only `assigned_to` changes; the creator column is immutable.
pub async fn assign_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<AssignTicketRequest>,
) -> ApiResult<Json<AssignTicketResponse>> {
    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Admin).await?;

    // The gate saw the ticket, but it may vanish before this write; treat
    // an empty update as NotFound
    let ticket = Ticket::assign(&state.db, payload.ticket_id, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    tracing::info!(ticket_id = %ticket.id, assigned_to = %payload.user_id, "Ticket assigned");

    Ok(Json(AssignTicketResponse {
        success: true,
        assigned_ticket: ticket,
        message: "Ticket assigned successfully".to_string(),
    }))
}

/// Updates a ticket's status (ADMIN), journaling the transition
///
/// The status write and the history append commit in one transaction; a
/// failure of either leaves both unapplied.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<UpdateTicketResponse>> {
    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Admin).await?;

    let (ticket, _entry) =
        Ticket::update_status(&state.db, payload.ticket_id, payload.status, auth.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    tracing::info!(
        ticket_id = %ticket.id,
        status = ticket.status.as_str(),
        "Ticket status updated"
    );

    Ok(Json(UpdateTicketResponse {
        success: true,
        updated_ticket: ticket,
        message: "Ticket status updated successfully".to_string(),
    }))
}

/// Updates a ticket's title and description (ADMIN)
pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateTicketRequest>,
) -> ApiResult<Json<UpdateTicketResponse>> {
    payload.validate()?;

    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Admin).await?;

    let ticket = Ticket::update_details(
        &state.db,
        payload.ticket_id,
        &payload.title,
        &payload.description,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(Json(UpdateTicketResponse {
        success: true,
        updated_ticket: ticket,
        message: "Ticket updated successfully".to_string(),
    }))
}

/// Deletes a ticket and its history (ADMIN)
///
/// History rows and the ticket are removed in one transaction, so no
/// orphaned history can remain.
pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<DeleteTicketRequest>,
) -> ApiResult<Json<DeleteTicketResponse>> {
    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Admin).await?;

    let ticket = Ticket::delete(&state.db, payload.ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    tracing::info!(ticket_id = %ticket.id, "Ticket deleted");

    Ok(Json(DeleteTicketResponse {
        success: true,
        deleted_ticket: ticket,
        message: "Ticket deleted successfully".to_string(),
    }))
}

/// Appends a message (status transition entry) to a ticket's history (AGENT)
pub async fn add_ticket_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<AddMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Agent).await?;

    let entry = HistoryEntry::append(
        &state.db,
        payload.ticket_id,
        payload.new_status,
        payload.user_id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddMessageResponse {
            success: true,
            new_message: entry,
            message: "Message added successfully".to_string(),
        }),
    ))
}

/// Lists a ticket's history in insertion order (AGENT)
///
/// Returns 404 when the ticket has no history yet.
pub async fn get_ticket_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<GetMessagesRequest>,
) -> ApiResult<Json<GetMessagesResponse>> {
    gate::require_ticket_role(&state.db, payload.ticket_id, auth.user_id, OrgRole::Agent).await?;

    let messages = HistoryEntry::list(&state.db, payload.ticket_id).await?;

    if messages.is_empty() {
        return Err(ApiError::NotFound(
            "No messages found for this ticket".to_string(),
        ));
    }

    Ok(Json(GetMessagesResponse {
        success: true,
        messages,
        message: "Messages retrieved successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ticket_defaults_omitted_fields() {
        let payload: CreateTicketRequest = serde_json::from_str(
            r#"{"title":"Printer on fire",
                "description":"Third floor",
                "org_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11"}"#,
        )
        .unwrap();
        assert!(payload.status.is_none());
        assert!(payload.priority.is_none());
    }

    #[test]
    fn test_update_status_rejects_unknown_status() {
        let result = serde_json::from_str::<UpdateStatusRequest>(
            r#"{"ticket_id":"6bfc5fe5-7f69-4b0c-8a3a-0d5e4e8b8f11",
                "status":"ON_HOLD"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ticket_response_wire_keys() {
        use chrono::Utc;

        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: "d".to_string(),
            org_id: Uuid::new_v4(),
            status: TicketStatus::Open,
            priority: TicketPriority::Medium,
            created_by: Uuid::new_v4(),
            assigned_to: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(CreateTicketResponse {
            success: true,
            new_ticket: ticket,
            message: "ok".to_string(),
        })
        .unwrap();

        assert!(body.get("newTicket").is_some());
        assert_eq!(body["newTicket"]["status"], "OPEN");
        assert_eq!(body["newTicket"]["priority"], "MEDIUM");
    }
}
