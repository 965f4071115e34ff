use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::entities::StreakSummary;
use crate::services::calendar::WeekCalendar;

/// Distinct week indices containing at least one timestamp.
pub fn active_weeks(
    calendar: &WeekCalendar,
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
) -> BTreeSet<i64> {
    timestamps
        .into_iter()
        .map(|at| calendar.week_index(at))
        .collect()
}

pub fn longest_streak(weeks: &BTreeSet<i64>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<i64> = None;
    for &week in weeks {
        run = match previous {
            Some(prev) if week == prev + 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(week);
    }
    longest
}

/// Run ending at `current_week`, or at the week before it when the current
/// week has no activity yet.
pub fn current_streak(weeks: &BTreeSet<i64>, current_week: i64) -> u32 {
    let end = if weeks.contains(&current_week) {
        current_week
    } else if weeks.contains(&(current_week - 1)) {
        current_week - 1
    } else {
        return 0;
    };
    let mut run = 0u32;
    let mut week = end;
    while weeks.contains(&week) {
        run += 1;
        week -= 1;
    }
    run
}

pub fn summarize_streaks(
    calendar: &WeekCalendar,
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StreakSummary {
    let weeks = active_weeks(calendar, timestamps);
    StreakSummary {
        current: current_streak(&weeks, calendar.week_index(now)),
        longest: longest_streak(&weeks),
    }
}
