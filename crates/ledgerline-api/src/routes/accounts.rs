//! Routes for the Account bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use ledgerline_account::application::command_handlers::{self, CommandOutcome};
use ledgerline_account::application::query_handlers::{self, AccountView};
use ledgerline_account::domain::commands::AccountCommand;
use ledgerline_core::repository::StoredEvent;
use ledgerline_core::stream::StreamId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    /// The account holder's name.
    pub owner: String,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The account stream the command was applied to.
    pub stream_id: StreamId,
    /// Stream version after the append.
    pub new_version: i64,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        Self {
            event_ids: outcome.events.iter().map(|e| e.event_id).collect(),
            stream_id: outcome.stream_id,
            new_version: outcome.new_version,
        }
    }
}

/// POST /
#[instrument(skip(state, request))]
async fn open_account(
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), ApiError> {
    let correlation_id = Uuid::now_v7();
    info!(%correlation_id, "handling open command");

    let outcome = command_handlers::submit(
        None,
        AccountCommand::Open {
            owner: request.owner,
        },
        correlation_id,
        state.clock.as_ref(),
        &*state.event_repository,
        state.conflict_policy,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// POST /{stream_id}/commands
#[instrument(skip(state))]
async fn submit_command(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
    Json(command): Json<AccountCommand>,
) -> Result<Json<CommandResponse>, ApiError> {
    let stream_id = StreamId::new(stream_id)?;
    let correlation_id = Uuid::now_v7();
    info!(%correlation_id, "handling account command");

    let outcome = command_handlers::submit(
        Some(stream_id),
        command,
        correlation_id,
        state.clock.as_ref(),
        &*state.event_repository,
        state.conflict_policy,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// GET /{stream_id}
#[instrument(skip(state))]
async fn get_account(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
) -> Result<Json<AccountView>, ApiError> {
    let stream_id = StreamId::new(stream_id)?;
    let view = query_handlers::get_account_by_id(&stream_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /{stream_id}/events
#[instrument(skip(state))]
async fn get_events(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
) -> Result<Json<Vec<StoredEvent>>, ApiError> {
    let stream_id = StreamId::new(stream_id)?;
    let events = query_handlers::get_stream(&stream_id, &*state.event_repository).await?;
    Ok(Json(events))
}

/// Returns the router for the account context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_account))
        .route("/{stream_id}", get(get_account))
        .route("/{stream_id}/commands", post(submit_command))
        .route("/{stream_id}/events", get(get_events))
}
