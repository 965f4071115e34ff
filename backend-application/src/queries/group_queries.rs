use chrono::{DateTime, Utc};

use backend_domain::{
    goal_percentage, rank_members, sum_entries, Group, GroupId, GroupMembership, GroupProgress,
    LeaderboardEntry,
};

use crate::{AppError, AppState, NotFoundKind};

pub async fn get_group(state: &AppState, group_id: &GroupId) -> Result<Group, AppError> {
    let result = require_group(state, group_id).await;
    state.observe("get_group", result)
}

pub async fn list_members(
    state: &AppState,
    group_id: &GroupId,
) -> Result<Vec<GroupMembership>, AppError> {
    let result: Result<Vec<GroupMembership>, AppError> = async {
        require_group(state, group_id).await?;
        Ok(state.records().members(group_id).await?)
    }
    .await;
    state.observe("list_members", result)
}

/// Members ranked by points earned in the current calendar month.
pub async fn leaderboard(
    state: &AppState,
    group_id: &GroupId,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    let result: Result<Vec<LeaderboardEntry>, AppError> = async {
        require_group(state, group_id).await?;
        let window = state.calendar.month_window(state.now());
        let scored = monthly_scores(state, group_id, window).await?;
        Ok(rank_members(scored))
    }
    .await;
    state.observe("leaderboard", result)
}

pub async fn group_progress(
    state: &AppState,
    group_id: &GroupId,
) -> Result<GroupProgress, AppError> {
    let result: Result<GroupProgress, AppError> = async {
        let group = require_group(state, group_id).await?;
        let (window_start, window_end) = state.calendar.month_window(state.now());
        let current_points: i64 = monthly_scores(state, group_id, (window_start, window_end))
            .await?
            .iter()
            .map(|(_, points)| points)
            .sum();
        Ok(GroupProgress {
            group_id: group.id,
            current_points,
            monthly_goal: group.monthly_goal,
            percentage: goal_percentage(current_points, group.monthly_goal),
            window_start,
            window_end,
        })
    }
    .await;
    state.observe("group_progress", result)
}

async fn require_group(state: &AppState, group_id: &GroupId) -> Result<Group, AppError> {
    state
        .records()
        .group(group_id)
        .await?
        .ok_or(AppError::NotFound(NotFoundKind::Group))
}

async fn monthly_scores(
    state: &AppState,
    group_id: &GroupId,
    (start, end): (DateTime<Utc>, DateTime<Utc>),
) -> Result<Vec<(GroupMembership, i64)>, AppError> {
    let records = state.records();
    let members = records.members(group_id).await?;
    let mut scored = Vec::with_capacity(members.len());
    for member in members {
        let entries = records.ledger_for_user(&member.user_id).await?;
        let points = sum_entries(
            entries.iter().filter(|entry| entry.created_at < end),
            Some(start),
        );
        scored.push((member, points));
    }
    Ok(scored)
}
