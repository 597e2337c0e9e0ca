use std::collections::BTreeMap;

use chrono::Datelike;

use super::daily::DayMap;

/// One row of the summary table: minute totals for a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub base_minutes: i64,
    pub overtime_minutes: i64,
    pub task_minutes: i64,
    pub call_minutes: i64,
}

impl MonthSummary {
    /// Base plus overtime. Task time overlaps the session anyway and calls
    /// are paid separately, so neither joins the total.
    pub fn grand_total_minutes(&self) -> i64 {
        self.base_minutes + self.overtime_minutes
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Rolls daily buckets up into month rows, ascending by month.
pub fn monthly_rollup(days: &DayMap) -> Vec<MonthSummary> {
    let mut months = BTreeMap::<(i32, u32), MonthSummary>::new();

    for (day, buckets) in days {
        let row = months
            .entry((day.year(), day.month()))
            .or_insert_with(|| MonthSummary {
                year: day.year(),
                month: day.month(),
                base_minutes: 0,
                overtime_minutes: 0,
                task_minutes: 0,
                call_minutes: 0,
            });
        row.base_minutes += buckets.base_minutes;
        row.overtime_minutes += buckets.overtime_minutes;
        row.task_minutes += buckets.task_minutes;
        row.call_minutes += buckets.call_minutes;
    }

    months.into_values().collect()
}
