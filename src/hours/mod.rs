//! Splitting logged time into pay-relevant buckets.
//!
//! A workday is classified against a daily base window (09:00-18:00 unless
//! configured otherwise): quarter hours inside the window are base time,
//! everything else is overtime. On-call entries bypass the window and count
//! raw minutes. All reported values are rounded to the nearest quarter hour.

pub mod daily;
pub mod monthly;

use chrono::{DateTime, Duration, TimeZone, Timelike};

use crate::storage::entities::TaskEntity;

/// Granularity of every bucket in the application.
pub const QUARTER_MINUTES: i64 = 15;

/// The standard working window, measured in whole wall-clock hours.
/// Half-open: an interval starting at `end` already counts as overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseWindow {
    start_hour: u32,
    end_hour: u32,
}

impl BaseWindow {
    pub fn new_opt(start_hour: u32, end_hour: u32) -> Option<Self> {
        if start_hour < end_hour && end_hour <= 24 {
            Some(Self {
                start_hour,
                end_hour,
            })
        } else {
            None
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        self.start_hour <= hour && hour < self.end_hour
    }
}

impl Default for BaseWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
        }
    }
}

/// Work session minutes split by the base window. Both values are multiples
/// of [QUARTER_MINUTES].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoursBreakdown {
    pub base_minutes: i64,
    pub overtime_minutes: i64,
}

impl HoursBreakdown {
    pub fn total_minutes(&self) -> i64 {
        self.base_minutes + self.overtime_minutes
    }
}

/// Splits a work interval into base and overtime minutes.
///
/// The interval is walked in quarter-hour steps anchored at `start`. A step
/// only counts when the whole quarter fits before `end`, so a trailing
/// partial quarter is dropped. Each step is classified by the wall-clock
/// hour at which it begins, in the timezone of the inputs.
pub fn classify_work<Tz: TimeZone>(
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    window: BaseWindow,
) -> HoursBreakdown {
    let mut split = HoursBreakdown::default();

    let mut cursor = start;
    loop {
        let next = cursor.clone() + Duration::minutes(QUARTER_MINUTES);
        if next > end {
            break;
        }
        if window.contains_hour(cursor.hour()) {
            split.base_minutes += QUARTER_MINUTES;
        } else {
            split.overtime_minutes += QUARTER_MINUTES;
        }
        cursor = next;
    }

    split
}

/// Rounds a raw minute count to the nearest quarter hour, ties away from
/// zero. Inputs are never negative in practice.
pub fn round_quarter_minutes(minutes: i64) -> i64 {
    (minutes as f64 / QUARTER_MINUTES as f64).round() as i64 * QUARTER_MINUTES
}

/// Same rounding expressed in hours, for display: 50 minutes become 0.75.
pub fn round_quarter_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60. * 4.).round() / 4.
}

/// Total raw on-call minutes over the given tasks. Entries not flagged as
/// calls are ignored, reversed intervals count as zero. Quarter rounding is
/// applied once, over the sum.
pub fn call_minutes<'a>(tasks: impl IntoIterator<Item = &'a TaskEntity>) -> i64 {
    let raw = tasks
        .into_iter()
        .filter(|t| t.call)
        .map(|t| t.raw_minutes())
        .sum();
    round_quarter_minutes(raw)
}

#[cfg(test)]
mod classify_tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use super::{classify_work, BaseWindow, HoursBreakdown, QUARTER_MINUTES};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(
            TEST_DATE,
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        ))
    }

    fn split(start: chrono::DateTime<Utc>, end: chrono::DateTime<Utc>) -> HoursBreakdown {
        classify_work(start, end, BaseWindow::default())
    }

    #[test]
    fn whole_day_inside_window() {
        let v = split(at(9, 0), at(18, 0));
        assert_eq!(v.base_minutes, 9 * 60);
        assert_eq!(v.overtime_minutes, 0);
    }

    #[test]
    fn evening_spills_into_overtime() {
        let v = split(at(16, 0), at(20, 30));
        assert_eq!(v.base_minutes, 2 * 60);
        assert_eq!(v.overtime_minutes, 2 * 60 + 30);
    }

    #[test]
    fn early_morning_is_overtime() {
        let v = split(at(6, 0), at(9, 0));
        assert_eq!(v.base_minutes, 0);
        assert_eq!(v.overtime_minutes, 3 * 60);
    }

    #[test]
    fn trailing_partial_quarter_is_dropped() {
        let v = split(at(10, 0), at(10, 40));
        assert_eq!(v.total_minutes(), 2 * QUARTER_MINUTES);

        let v = split(at(10, 0), at(10, 44));
        assert_eq!(v.total_minutes(), 2 * QUARTER_MINUTES);

        let v = split(at(10, 0), at(10, 45));
        assert_eq!(v.total_minutes(), 3 * QUARTER_MINUTES);
    }

    #[test]
    fn steps_anchor_at_start_not_at_clock_quarters() {
        // 8:50 start: the 8:50-9:05 step begins outside the window and is
        // overtime even though most of it lies after 9:00.
        let v = split(at(8, 50), at(9, 20));
        assert_eq!(v.overtime_minutes, QUARTER_MINUTES);
        assert_eq!(v.base_minutes, QUARTER_MINUTES);
    }

    #[test]
    fn window_end_is_exclusive() {
        // The 17:45 step starts inside, the 18:00 one does not.
        let v = split(at(17, 45), at(18, 15));
        assert_eq!(v.base_minutes, QUARTER_MINUTES);
        assert_eq!(v.overtime_minutes, QUARTER_MINUTES);
    }

    #[test]
    fn crossing_midnight_accumulates_overtime() {
        let start = at(23, 0);
        let end = start + chrono::Duration::hours(2);
        let v = split(start, end);
        assert_eq!(v.base_minutes, 0);
        assert_eq!(v.overtime_minutes, 2 * 60);
    }

    #[test]
    fn empty_and_reversed_intervals_are_zero() {
        assert_eq!(split(at(9, 0), at(9, 0)), HoursBreakdown::default());
        assert_eq!(split(at(9, 0), at(8, 0)), HoursBreakdown::default());
    }

    #[test]
    fn custom_window() {
        let window = BaseWindow::new_opt(22, 24).unwrap();
        let v = classify_work(at(21, 0), at(23, 0), window);
        assert_eq!(v.base_minutes, 60);
        assert_eq!(v.overtime_minutes, 60);
    }

    #[test]
    fn degenerate_windows_are_rejected() {
        assert!(BaseWindow::new_opt(9, 9).is_none());
        assert!(BaseWindow::new_opt(18, 9).is_none());
        assert!(BaseWindow::new_opt(9, 25).is_none());
    }
}
