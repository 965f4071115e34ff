use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::event_commands;
use backend_application::queries::attendance_queries;
use backend_application::AppState;
use backend_domain::{AttendanceState, Event, EventId, JoinRecord, NewEvent};

use crate::error::HttpError;
use crate::middleware::guard;

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), HttpError> {
    let identity = guard(&state.config, &headers)?;
    let event = event_commands::create_event(&state, &identity, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, HttpError> {
    guard(&state.config, &headers)?;
    let event = attendance_queries::get_event(&state, &EventId::from(event_id)).await?;
    Ok(Json(event))
}

pub async fn get_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceState>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let attendance =
        attendance_queries::attendance_state(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(attendance))
}

pub async fn list_attendees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<JoinRecord>>, HttpError> {
    guard(&state.config, &headers)?;
    let attendees = attendance_queries::list_attendees(&state, &EventId::from(event_id)).await?;
    Ok(Json(attendees))
}
