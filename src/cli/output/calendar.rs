use ansi_term::{Colour, Style};
use chrono::{Datelike, Duration, NaiveDate};

use crate::hours::daily::DayMap;

/// Markers under each day, in fixed order: base time, overtime, calls.
const BASE_MARK: char = 'b';
const OVERTIME_MARK: char = 'o';
const CALL_MARK: char = 'c';

/// Renders a month as a monday-first grid. Each cell carries the day number
/// and up to three colored markers for the categories logged on that day.
/// Spill-over days of the neighbouring months render dimmed.
pub fn render_month(year: i32, month: u32, days: &DayMap, today: NaiveDate) -> String {
    let mut out = String::new();
    for label in ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"] {
        out.push_str(&format!("{label:>3}     "));
    }
    out.truncate(out.trim_end().len());
    out.push('\n');

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("Month boundaries should always form valid dates");
    let mut cursor = first - Duration::days(first.weekday().num_days_from_monday() as i64);

    while cursor.month() == month || cursor < first {
        let mut row = String::new();
        for _ in 0..7 {
            row.push_str(&render_cell(cursor, month, days, today));
            cursor += Duration::days(1);
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

fn render_cell(day: NaiveDate, month: u32, days: &DayMap, today: NaiveDate) -> String {
    let number = if day == today {
        Style::new().bold().underline().paint(format!("{:>3}", day.day()))
    } else if day.month() == month {
        Style::new().paint(format!("{:>3}", day.day()))
    } else {
        Style::new().dimmed().paint(format!("{:>3}", day.day()))
    };

    let mut marks = String::new();
    let mut mark_count = 0;
    if let Some(buckets) = days.get(&day).filter(|_| day.month() == month) {
        let categories = [
            (buckets.base_minutes, BASE_MARK, Colour::Blue),
            (buckets.overtime_minutes, OVERTIME_MARK, Colour::Red),
            (buckets.call_minutes, CALL_MARK, Colour::Yellow),
        ];
        for (minutes, mark, colour) in categories {
            if minutes > 0 {
                marks.push_str(&colour.paint(mark.to_string()).to_string());
                mark_count += 1;
            }
        }
    }

    // Escape codes have no width, pad by the visible mark count instead.
    format!("{number} {marks}{}", " ".repeat(4 - mark_count))
}
