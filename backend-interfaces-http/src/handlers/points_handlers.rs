use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backend_application::commands::ledger_commands;
use backend_application::queries::points_queries;
use backend_application::AppState;
use backend_domain::{AwardRequest, LedgerEntry, UserId, UserStats};

use crate::error::HttpError;
use crate::middleware::guard;

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PointsTotal {
    pub user_id: UserId,
    pub points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StreakReport {
    pub user_id: UserId,
    pub current_streak: u32,
    pub longest_streak: u32,
}

pub async fn award_points(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AwardRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), HttpError> {
    let identity = guard(&state.config, &headers)?;
    let entry = ledger_commands::award_points(&state, &identity, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_points(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<PointsQuery>,
) -> Result<Json<PointsTotal>, HttpError> {
    guard(&state.config, &headers)?;
    let user_id = UserId::from(user_id);
    let points = points_queries::sum_for(&state, &user_id, query.since).await?;
    Ok(Json(PointsTotal {
        user_id,
        points,
        since: query.since,
    }))
}

pub async fn get_streaks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<StreakReport>, HttpError> {
    guard(&state.config, &headers)?;
    let user_id = UserId::from(user_id);
    let current_streak = points_queries::calculate_user_weekly_streak(&state, &user_id).await?;
    let longest_streak = points_queries::calculate_user_longest_streak(&state, &user_id).await?;
    Ok(Json(StreakReport {
        user_id,
        current_streak,
        longest_streak,
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, HttpError> {
    guard(&state.config, &headers)?;
    let stats = points_queries::user_stats(&state, &UserId::from(user_id)).await?;
    Ok(Json(stats))
}

pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LedgerEntry>>, HttpError> {
    guard(&state.config, &headers)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let history =
        points_queries::ledger_history(&state, &UserId::from(user_id), Some(limit)).await?;
    Ok(Json(history))
}
