use chrono::{DateTime, Utc};

use backend_domain::{sum_entries, summarize_streaks, LedgerEntry, StreakSummary, UserId, UserStats};

use crate::{AppError, AppState};

/// Signed sum of the user's ledger, optionally from `since` onwards.
pub async fn sum_for(
    state: &AppState,
    user_id: &UserId,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let result: Result<i64, AppError> = async {
        let entries = state.records().ledger_for_user(user_id).await?;
        Ok(sum_entries(&entries, since))
    }
    .await;
    state.observe("sum_for", result)
}

pub async fn calculate_user_total_points(
    state: &AppState,
    user_id: &UserId,
) -> Result<i64, AppError> {
    sum_for(state, user_id, None).await
}

pub async fn calculate_user_weekly_streak(
    state: &AppState,
    user_id: &UserId,
) -> Result<u32, AppError> {
    Ok(streaks(state, user_id).await?.current)
}

pub async fn calculate_user_longest_streak(
    state: &AppState,
    user_id: &UserId,
) -> Result<u32, AppError> {
    Ok(streaks(state, user_id).await?.longest)
}

pub async fn user_stats(state: &AppState, user_id: &UserId) -> Result<UserStats, AppError> {
    let result: Result<UserStats, AppError> = async {
        let records = state.records();
        let entries = records.ledger_for_user(user_id).await?;
        let joins = records.joins_for_user(user_id).await?;
        let streaks = summarize_streaks(
            &state.calendar,
            entries.iter().map(|entry| entry.created_at),
            state.now(),
        );
        let events_attended = joins
            .iter()
            .filter(|join| join.checked_out_at.is_some())
            .count();
        Ok(UserStats {
            user_id: user_id.clone(),
            total_points: sum_entries(&entries, None),
            current_streak: streaks.current,
            longest_streak: streaks.longest,
            events_attended: u32::try_from(events_attended).unwrap_or(u32::MAX),
        })
    }
    .await;
    state.observe("user_stats", result)
}

/// Newest first, ties broken by entry id for a stable order.
pub async fn ledger_history(
    state: &AppState,
    user_id: &UserId,
    limit: Option<usize>,
) -> Result<Vec<LedgerEntry>, AppError> {
    let result: Result<Vec<LedgerEntry>, AppError> = async {
        let mut entries = state.records().ledger_for_user(user_id).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
    .await;
    state.observe("ledger_history", result)
}

async fn streaks(state: &AppState, user_id: &UserId) -> Result<StreakSummary, AppError> {
    let result: Result<StreakSummary, AppError> = async {
        let entries = state.records().ledger_for_user(user_id).await?;
        Ok(summarize_streaks(
            &state.calendar,
            entries.iter().map(|entry| entry.created_at),
            state.now(),
        ))
    }
    .await;
    state.observe("streaks", result)
}
