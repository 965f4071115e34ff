use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};

use crate::entities::CalendarConfig;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Maps instants onto deployment-wide week and month buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    week_start: Weekday,
    offset: FixedOffset,
}

impl WeekCalendar {
    pub fn new(config: CalendarConfig) -> Option<Self> {
        if config.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return None;
        }
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60)?;
        Some(Self {
            week_start: config.week_start,
            offset,
        })
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Consecutive weeks have consecutive indices. Week 0 is the one
    /// containing 1970-01-01 in local time.
    pub fn week_index(&self, at: DateTime<Utc>) -> i64 {
        let days = self.local_date(at).signed_duration_since(epoch()).num_days();
        (days + self.anchor_shift()).div_euclid(7)
    }

    /// First instant of week `index`.
    pub fn week_start_instant(&self, index: i64) -> DateTime<Utc> {
        let first_day = epoch() + Duration::days(index * 7 - self.anchor_shift());
        self.local_midnight_to_utc(first_day)
    }

    /// `[first day of the local month, first day of the next month)`.
    pub fn month_window(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let local = self.local_date(at);
        let first = local.with_day(1).unwrap_or(local);
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        }
        .unwrap_or(first + Duration::days(31));
        (
            self.local_midnight_to_utc(first),
            self.local_midnight_to_utc(next),
        )
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn local_midnight_to_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::default());
        let offset_seconds = i64::from(self.offset.local_minus_utc());
        (midnight - Duration::seconds(offset_seconds)).and_utc()
    }

    // Days between the configured week start and 1970-01-01, a Thursday.
    fn anchor_shift(&self) -> i64 {
        let epoch_day = i64::from(Weekday::Thu.num_days_from_monday());
        let start_day = i64::from(self.week_start.num_days_from_monday());
        (epoch_day - start_day).rem_euclid(7)
    }
}

impl Default for WeekCalendar {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
            offset: Utc.fix(),
        }
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn calendar(week_start: Weekday, utc_offset_minutes: i32) -> WeekCalendar {
        WeekCalendar::new(CalendarConfig {
            week_start,
            utc_offset_minutes,
        })
        .expect("calendar")
    }

    #[test]
    fn monday_weeks_split_between_sunday_and_monday() {
        let cal = calendar(Weekday::Mon, 0);
        let sunday = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap();
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(cal.week_index(monday), cal.week_index(sunday) + 1);
        assert_eq!(cal.week_start_instant(cal.week_index(monday)), monday);
    }

    #[test]
    fn epoch_week_is_zero_regardless_of_start_day() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        for start in [Weekday::Mon, Weekday::Thu, Weekday::Fri, Weekday::Sun] {
            assert_eq!(calendar(start, 0).week_index(epoch), 0, "{start:?}");
        }
        let before = Utc.with_ymd_and_hms(1969, 12, 31, 12, 0, 0).unwrap();
        assert_eq!(calendar(Weekday::Thu, 0).week_index(before), -1);
    }

    #[test]
    fn sunday_start_moves_the_boundary() {
        let cal = calendar(Weekday::Sun, 0);
        let saturday = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
        assert_eq!(cal.week_index(sunday), cal.week_index(saturday) + 1);
        assert_eq!(cal.week_start_instant(cal.week_index(sunday)), sunday);
    }

    #[test]
    fn offset_shifts_bucket_boundaries() {
        // Monday 00:30 at UTC+2 is still Sunday in UTC.
        let utc_cal = calendar(Weekday::Mon, 0);
        let plus_two = calendar(Weekday::Mon, 120);
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(plus_two.week_index(instant), utc_cal.week_index(instant) + 1);
        assert_eq!(
            plus_two.week_start_instant(plus_two.week_index(instant)),
            Utc.with_ymd_and_hms(2026, 3, 1, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn month_window_covers_the_local_month() {
        let cal = calendar(Weekday::Mon, 0);
        let (start, end) = cal.month_window(Utc.with_ymd_and_hms(2026, 12, 15, 8, 0, 0).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());

        let west = calendar(Weekday::Mon, -300);
        let (start, _) = west.month_window(Utc.with_ymd_and_hms(2026, 4, 1, 3, 0, 0).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn rejects_offsets_beyond_fourteen_hours() {
        assert!(WeekCalendar::new(CalendarConfig {
            week_start: Weekday::Mon,
            utc_offset_minutes: 15 * 60,
        })
        .is_none());
    }
}
