use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};


/// This is the standard way of converting a date to a string in worklog.
/// Record file names and day keys all go through here.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    (date + Duration::days(1)).with_time(NaiveTime::MIN).unwrap()
}

/// Renders a minute total as `3h 45m`, the format of the summary table and
/// the day view.
pub fn format_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_to_record_name, format_minutes};

    #[test]
    fn record_names_are_iso_dates() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(date_to_record_name(date), "2025-03-07");
    }

    #[test]
    fn minutes_format() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(45), "0h 45m");
        assert_eq!(format_minutes(9 * 60 + 15), "9h 15m");
    }
}
