use std::fmt;

use chrono::{Datelike, NaiveDate};
use sqlx::MySqlPool;

use crate::model::calendar::{weekday_name, WeeklyHolidays};

pub const WEEKLY_HOLIDAYS_SETTING: &str = "weekly_holidays";

/// Why a date is exempt from attendance evaluation. Kept discriminated so
/// the aggregator can tell "holiday, zero activity" from "no scans yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidayReason {
    Weekly(chrono::Weekday),
    Dated(String),
}

impl fmt::Display for HolidayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidayReason::Weekly(day) => write!(f, "weekly holiday ({})", weekday_name(*day)),
            HolidayReason::Dated(label) => write!(f, "{label}"),
        }
    }
}

pub async fn load_weekly_holidays(pool: &MySqlPool) -> Result<WeeklyHolidays, sqlx::Error> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM app_settings WHERE name = ?")
        .bind(WEEKLY_HOLIDAYS_SETTING)
        .fetch_optional(pool)
        .await?;

    // No settings row means no recurring holidays were ever configured.
    Ok(value
        .map(|v| WeeklyHolidays::parse(&v))
        .unwrap_or_default())
}

pub async fn store_weekly_holidays(
    pool: &MySqlPool,
    days: &WeeklyHolidays,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO app_settings (name, value) VALUES (?, ?) \
         ON DUPLICATE KEY UPDATE value = VALUES(value)",
    )
    .bind(WEEKLY_HOLIDAYS_SETTING)
    .bind(days.to_setting_value())
    .execute(pool)
    .await?;
    Ok(())
}

/// The weekly check runs first and short-circuits; the dated table is only
/// consulted when the weekday is a working day.
pub async fn is_holiday(
    pool: &MySqlPool,
    date: NaiveDate,
) -> Result<Option<HolidayReason>, sqlx::Error> {
    let weekly = load_weekly_holidays(pool).await?;
    if weekly.contains(date.weekday()) {
        return Ok(Some(HolidayReason::Weekly(date.weekday())));
    }

    let label = sqlx::query_scalar::<_, String>("SELECT label FROM holidays WHERE date = ?")
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(label.map(HolidayReason::Dated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn weekly_reason_names_the_weekday() {
        let reason = HolidayReason::Weekly(Weekday::Sun);
        assert_eq!(reason.to_string(), "weekly holiday (sunday)");
    }

    #[test]
    fn dated_reason_is_the_label() {
        let reason = HolidayReason::Dated("Independence Day".into());
        assert_eq!(reason.to_string(), "Independence Day");
    }
}
