use chrono::{DateTime, Utc};

use crate::entities::{AwardPolicyConfig, Event};

/// Decides the points emitted by attendance transitions. Amounts are
/// unsigned; zero means no ledger entry is written.
pub trait AwardPolicy: Send + Sync {
    fn check_in_points(&self, event: &Event) -> u32;

    fn check_out_points(
        &self,
        event: &Event,
        checked_in_at: DateTime<Utc>,
        checked_out_at: DateTime<Utc>,
    ) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatAwardPolicy {
    pub check_in_points: u32,
    pub check_out_points: u32,
}

impl AwardPolicy for FlatAwardPolicy {
    fn check_in_points(&self, _event: &Event) -> u32 {
        self.check_in_points
    }

    fn check_out_points(&self, _event: &Event, _: DateTime<Utc>, _: DateTime<Utc>) -> u32 {
        self.check_out_points
    }
}

/// Check-out points scale with the time actually spent on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationAwardPolicy {
    pub check_in_points: u32,
    pub points_per_hour: u32,
    pub minimum_points: u32,
}

impl AwardPolicy for DurationAwardPolicy {
    fn check_in_points(&self, _event: &Event) -> u32 {
        self.check_in_points
    }

    fn check_out_points(
        &self,
        _event: &Event,
        checked_in_at: DateTime<Utc>,
        checked_out_at: DateTime<Utc>,
    ) -> u32 {
        let minutes = (checked_out_at - checked_in_at).num_minutes().max(0) as u64;
        let earned = minutes * u64::from(self.points_per_hour) / 60;
        u32::try_from(earned)
            .unwrap_or(u32::MAX)
            .max(self.minimum_points)
    }
}

pub fn build_award_policy(config: &AwardPolicyConfig) -> Box<dyn AwardPolicy> {
    match *config {
        AwardPolicyConfig::Flat {
            check_in_points,
            check_out_points,
        } => Box::new(FlatAwardPolicy {
            check_in_points,
            check_out_points,
        }),
        AwardPolicyConfig::Duration {
            check_in_points,
            points_per_hour,
            minimum_points,
        } => Box::new(DurationAwardPolicy {
            check_in_points,
            points_per_hour,
            minimum_points,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{CauseCategory, EventId, UserId};
    use chrono::{Duration, TimeZone};

    fn event() -> Event {
        let starts_at = Utc.with_ymd_and_hms(2026, 5, 9, 9, 0, 0).unwrap();
        Event {
            id: EventId::from("e1"),
            title: "Beach cleanup".to_string(),
            description: String::new(),
            cause: CauseCategory::Environment,
            starts_at,
            ends_at: starts_at + Duration::hours(3),
            location: None,
            capacity: None,
            organization_id: None,
            created_by: UserId::from("organizer"),
            created_at: starts_at - Duration::days(7),
        }
    }

    #[test]
    fn default_policy_is_flat_ten_and_five() {
        let policy = build_award_policy(&AwardPolicyConfig::default());
        let event = event();
        assert_eq!(policy.check_in_points(&event), 10);
        assert_eq!(
            policy.check_out_points(&event, event.starts_at, event.ends_at),
            5
        );
    }

    #[test]
    fn duration_policy_rounds_down_and_applies_minimum() {
        let policy = build_award_policy(&AwardPolicyConfig::Duration {
            check_in_points: 2,
            points_per_hour: 10,
            minimum_points: 3,
        });
        let event = event();
        let start = event.starts_at;
        assert_eq!(policy.check_in_points(&event), 2);
        assert_eq!(
            policy.check_out_points(&event, start, start + Duration::minutes(150)),
            25
        );
        assert_eq!(
            policy.check_out_points(&event, start, start + Duration::minutes(5)),
            3
        );
        assert_eq!(policy.check_out_points(&event, start, start), 3);
    }
}
