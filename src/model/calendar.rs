use std::collections::HashSet;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,

    #[schema(example = "2026-08-17", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "Independence Day")]
    pub label: String,
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// The recurring weekly holiday set, stored as one comma-separated settings
/// value of lowercase weekday names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyHolidays(HashSet<Weekday>);

impl WeeklyHolidays {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Self {
        WeeklyHolidays(days.into_iter().collect())
    }

    /// Parses the stored value. Unknown names are skipped: a config typo
    /// must not take scanning down.
    pub fn parse(value: &str) -> Self {
        WeeklyHolidays(
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .filter_map(|part| Weekday::from_str(part).ok())
                .collect(),
        )
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical stored form, ordered Monday-first for stable round-trips.
    pub fn to_setting_value(&self) -> String {
        let mut days: Vec<Weekday> = self.0.iter().copied().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.into_iter()
            .map(weekday_name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_short_names_case_insensitively() {
        let set = WeeklyHolidays::parse("Sunday, sat");
        assert!(set.contains(Weekday::Sun));
        assert!(set.contains(Weekday::Sat));
        assert!(!set.contains(Weekday::Mon));
    }

    #[test]
    fn unknown_names_are_skipped() {
        let set = WeeklyHolidays::parse("sunday,notaday,,friday");
        assert!(set.contains(Weekday::Sun));
        assert!(set.contains(Weekday::Fri));
        let stored = set.to_setting_value();
        assert_eq!(stored, "friday,sunday");
    }

    #[test]
    fn empty_value_means_no_recurring_holidays() {
        assert!(WeeklyHolidays::parse("").is_empty());
    }
}
