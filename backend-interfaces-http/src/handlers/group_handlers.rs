use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use backend_application::commands::group_commands;
use backend_application::queries::group_queries;
use backend_application::AppState;
use backend_domain::{
    Group, GroupId, GroupMembership, GroupProgress, GroupUpdate, LeaderboardEntry, NewGroup, UserId,
};

use crate::error::HttpError;
use crate::middleware::guard;

#[derive(Debug, Deserialize)]
pub struct InviteAcceptance {
    pub invite_code: String,
}

pub async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewGroup>,
) -> Result<(StatusCode, Json<Group>), HttpError> {
    let identity = guard(&state.config, &headers)?;
    let group = group_commands::create_group(&state, &identity, payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, HttpError> {
    guard(&state.config, &headers)?;
    let group = group_queries::get_group(&state, &GroupId::from(group_id)).await?;
    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    Json(update): Json<GroupUpdate>,
) -> Result<Json<Group>, HttpError> {
    let identity = guard(&state.config, &headers)?;
    let group =
        group_commands::update_group(&state, &identity, &GroupId::from(group_id), update).await?;
    Ok(Json(group))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<InviteAcceptance>,
) -> Result<(StatusCode, Json<GroupMembership>), HttpError> {
    let identity = guard(&state.config, &headers)?;
    let membership = group_commands::join_group(&state, &identity, &payload.invite_code).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn list_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupMembership>>, HttpError> {
    guard(&state.config, &headers)?;
    let members = group_queries::list_members(&state, &GroupId::from(group_id)).await?;
    Ok(Json(members))
}

pub async fn remove_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, HttpError> {
    let identity = guard(&state.config, &headers)?;
    group_commands::remove_member(
        &state,
        &identity,
        &GroupId::from(group_id),
        &UserId::from(user_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let identity = guard(&state.config, &headers)?;
    group_commands::leave_group(&state, &identity, &GroupId::from(group_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<LeaderboardEntry>>, HttpError> {
    guard(&state.config, &headers)?;
    let board = group_queries::leaderboard(&state, &GroupId::from(group_id)).await?;
    Ok(Json(board))
}

pub async fn get_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
) -> Result<Json<GroupProgress>, HttpError> {
    guard(&state.config, &headers)?;
    let progress = group_queries::group_progress(&state, &GroupId::from(group_id)).await?;
    Ok(Json(progress))
}
