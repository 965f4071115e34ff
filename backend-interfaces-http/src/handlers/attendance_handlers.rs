use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use backend_application::commands::attendance_commands::{self, AttendanceOutcome, EventQr};
use backend_application::AppState;
use backend_domain::EventId;

use crate::error::HttpError;
use crate::middleware::guard;

#[derive(Debug, Deserialize)]
pub struct QrScan {
    pub payload: String,
}

pub async fn join_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome =
        attendance_commands::join_event(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(outcome))
}

pub async fn leave_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome =
        attendance_commands::leave_event(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(outcome))
}

pub async fn check_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome = attendance_commands::check_in(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(outcome))
}

pub async fn check_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome =
        attendance_commands::check_out(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(outcome))
}

pub async fn issue_event_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Json<EventQr>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let qr =
        attendance_commands::issue_event_qr(&state, &identity, &EventId::from(event_id)).await?;
    Ok(Json(qr))
}

pub async fn check_in_by_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(scan): Json<QrScan>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome = attendance_commands::check_in_by_qr(&state, &identity, &scan.payload).await?;
    Ok(Json(outcome))
}

pub async fn check_out_by_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(scan): Json<QrScan>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let outcome = attendance_commands::check_out_by_qr(&state, &identity, &scan.payload).await?;
    Ok(Json(outcome))
}
