use crate::entities::{GroupMembership, LeaderboardEntry};

/// Ranks members by points, highest first. Equal points go to the earlier
/// member; equal join instants fall back to user id so the order is total.
pub fn rank_members(mut scored: Vec<(GroupMembership, i64)>) -> Vec<LeaderboardEntry> {
    scored.sort_by(|(a, a_points), (b, b_points)| {
        b_points
            .cmp(a_points)
            .then_with(|| a.joined_at.cmp(&b.joined_at))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    scored
        .into_iter()
        .enumerate()
        .map(|(index, (membership, points))| LeaderboardEntry {
            rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
            user_id: membership.user_id,
            role: membership.role,
            points,
            joined_at: membership.joined_at,
        })
        .collect()
}

/// Share of `goal` reached, clamped to `[0, 100]`.
pub fn goal_percentage(current_points: i64, goal: u32) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (100.0 * current_points as f64 / f64::from(goal)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GroupRole;
    use crate::value_objects::{GroupId, UserId};
    use chrono::{Duration, TimeZone, Utc};

    fn member(user: &str, joined_offset_days: i64) -> GroupMembership {
        GroupMembership {
            group_id: GroupId::from("g1"),
            user_id: UserId::from(user),
            role: GroupRole::Member,
            joined_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                + Duration::days(joined_offset_days),
        }
    }

    #[test]
    fn ranks_descend_by_points() {
        let board = rank_members(vec![
            (member("low", 0), 5),
            (member("high", 2), 40),
            (member("mid", 1), 20),
        ]);
        let order: Vec<_> = board.iter().map(|e| (e.rank, e.user_id.as_str())).collect();
        assert_eq!(order, vec![(1, "high"), (2, "mid"), (3, "low")]);
    }

    #[test]
    fn ties_go_to_the_earlier_member() {
        let board = rank_members(vec![(member("late", 5), 30), (member("early", 1), 30)]);
        assert_eq!(board[0].user_id.as_str(), "early");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].user_id.as_str(), "late");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(goal_percentage(50, 200), 25.0);
        assert_eq!(goal_percentage(500, 200), 100.0);
        assert_eq!(goal_percentage(-20, 200), 0.0);
        assert_eq!(goal_percentage(10, 0), 0.0);
    }
}
