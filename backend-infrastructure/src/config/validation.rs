use anyhow::{anyhow, Result};
use chrono::Weekday;

use backend_domain::AwardPolicyConfig;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;
const MAX_AWARD_POINTS: u32 = 10_000;

pub fn parse_week_start(value: &str) -> Result<Weekday> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| anyhow!("invalid week_start '{}', expected a weekday name", value))
}

pub fn validate_utc_offset(minutes: i32) -> Result<()> {
    if minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(anyhow!(
            "utc_offset_minutes {} out of range (max +/-{})",
            minutes,
            MAX_OFFSET_MINUTES
        ));
    }
    Ok(())
}

pub fn validate_award_policy(policy: &AwardPolicyConfig) -> Result<()> {
    let amounts: Vec<(&str, u32)> = match policy {
        AwardPolicyConfig::Flat {
            check_in_points,
            check_out_points,
        } => vec![
            ("check_in_points", *check_in_points),
            ("check_out_points", *check_out_points),
        ],
        AwardPolicyConfig::Duration {
            check_in_points,
            points_per_hour,
            minimum_points,
        } => vec![
            ("check_in_points", *check_in_points),
            ("points_per_hour", *points_per_hour),
            ("minimum_points", *minimum_points),
        ],
    };
    for (name, value) in amounts {
        if value > MAX_AWARD_POINTS {
            return Err(anyhow!(
                "award_policy.{} = {} exceeds {}",
                name,
                value,
                MAX_AWARD_POINTS
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_start_accepts_long_and_short_names() {
        assert_eq!(parse_week_start("monday").expect("monday"), Weekday::Mon);
        assert_eq!(parse_week_start(" Sun ").expect("sun"), Weekday::Sun);
        assert!(parse_week_start("someday").is_err());
    }

    #[test]
    fn offsets_beyond_fourteen_hours_are_rejected() {
        assert!(validate_utc_offset(-600).is_ok());
        assert!(validate_utc_offset(14 * 60).is_ok());
        assert!(validate_utc_offset(14 * 60 + 1).is_err());
    }

    #[test]
    fn absurd_award_amounts_are_rejected() {
        assert!(validate_award_policy(&AwardPolicyConfig::default()).is_ok());
        let err = validate_award_policy(&AwardPolicyConfig::Duration {
            check_in_points: 5,
            points_per_hour: 50_000,
            minimum_points: 0,
        })
        .expect_err("too many points");
        assert!(err.to_string().contains("points_per_hour"));
    }
}
