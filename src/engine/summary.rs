use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::engine::calendar;
use crate::engine::roster::month_bounds;
use crate::engine::window;
use crate::model::person::PersonScope;
use crate::model::window::AttendanceWindow;

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct StatusCounts {
    pub total: i64,
    pub on_time: i64,
    pub late: i64,
    pub sick: i64,
    pub leave: i64,
    pub absent: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailySummary {
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,

    /// Present when the date is a calendar exception; counts are then zero
    /// by construction, not because nobody scanned.
    #[schema(nullable = true, example = "weekly holiday (sunday)")]
    pub holiday: Option<String>,

    pub students: StatusCounts,
    pub employees: StatusCounts,

    pub total_classes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PeriodSummary {
    pub month: u32,
    pub year: i32,
    pub students: StatusCounts,
    pub employees: StatusCounts,
}

/// Derived Absent: population minus everyone with any recorded status, but
/// only after the day's cutoff has passed; before that the day is still in
/// progress and Absent reads zero. Clamped so an over-full roster of
/// override records can never push it negative.
pub fn derive_absent(total: i64, recorded: i64, now: NaiveTime, cutoff: NaiveTime) -> i64 {
    if now > cutoff {
        (total - recorded).max(0)
    } else {
        0
    }
}

/// The time-of-day gate for the derived Absent figure: the population's own
/// late cutoff, its entry close when no cutoff is set, 08:00 when the
/// window was never configured.
pub fn absent_cutoff(window: Option<&AttendanceWindow>) -> NaiveTime {
    window
        .map(|w| w.late_cutoff.unwrap_or(w.entry_close))
        .unwrap_or_else(|| NaiveTime::from_hms_opt(8, 0, 0).expect("valid literal time"))
}

async fn population_total(pool: &MySqlPool, scope: PersonScope) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {}",
        scope.population_table()
    ))
    .fetch_one(pool)
    .await
}

async fn distinct_for_day(
    pool: &MySqlPool,
    scope: PersonScope,
    date: NaiveDate,
    predicate: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(DISTINCT {key}) FROM {table} WHERE date = ? AND {predicate}",
        key = scope.key_column(),
        table = scope.attendance_table(),
    ))
    .bind(date)
    .fetch_one(pool)
    .await
}

async fn population_daily(
    pool: &MySqlPool,
    scope: PersonScope,
    date: NaiveDate,
    now: NaiveTime,
    window: Option<&AttendanceWindow>,
) -> Result<StatusCounts, sqlx::Error> {
    let total = population_total(pool, scope).await?;

    let on_time =
        distinct_for_day(pool, scope, date, "kind = 'entry' AND status = 'on_time'").await?;
    let late = distinct_for_day(pool, scope, date, "kind = 'entry' AND status = 'late'").await?;
    let sick = distinct_for_day(pool, scope, date, "status = 'sick'").await?;
    let leave = distinct_for_day(pool, scope, date, "status = 'leave'").await?;

    // Anyone with an entry or an excused status counts as recorded; stored
    // Absent overrides deliberately do not, so those people surface in the
    // derived figure the same way silent no-shows do.
    let recorded = distinct_for_day(
        pool,
        scope,
        date,
        "(kind = 'entry' AND status IN ('on_time', 'late')) OR status IN ('sick', 'leave')",
    )
    .await?;

    let absent = derive_absent(total, recorded, now, absent_cutoff(window));

    Ok(StatusCounts {
        total,
        on_time,
        late,
        sick,
        leave,
        absent,
    })
}

/// Today-at-a-glance counts per population. Calendar-exception days report
/// zero activity without touching the attendance tables.
pub async fn daily_summary(
    pool: &MySqlPool,
    date: NaiveDate,
    now: NaiveTime,
) -> Result<DailySummary, sqlx::Error> {
    let total_classes = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes")
        .fetch_one(pool)
        .await?;

    if let Some(reason) = calendar::is_holiday(pool, date).await? {
        let students = StatusCounts {
            total: population_total(pool, PersonScope::Students).await?,
            ..StatusCounts::default()
        };
        let employees = StatusCounts {
            total: population_total(pool, PersonScope::Employees).await?,
            ..StatusCounts::default()
        };
        return Ok(DailySummary {
            date,
            holiday: Some(reason.to_string()),
            students,
            employees,
            total_classes,
        });
    }

    let student_window = window::student_window(pool).await?;
    let staff_window = window::staff_window(pool).await?;

    let students =
        population_daily(pool, PersonScope::Students, date, now, student_window.as_ref()).await?;
    let employees =
        population_daily(pool, PersonScope::Employees, date, now, staff_window.as_ref()).await?;

    Ok(DailySummary {
        date,
        holiday: None,
        students,
        employees,
        total_classes,
    })
}

async fn distinct_for_period(
    pool: &MySqlPool,
    scope: PersonScope,
    first: NaiveDate,
    last: NaiveDate,
    predicate: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(DISTINCT {key}) FROM {table} WHERE date BETWEEN ? AND ? AND {predicate}",
        key = scope.key_column(),
        table = scope.attendance_table(),
    ))
    .bind(first)
    .bind(last)
    .fetch_one(pool)
    .await
}

async fn population_period(
    pool: &MySqlPool,
    scope: PersonScope,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<StatusCounts, sqlx::Error> {
    let total = population_total(pool, scope).await?;

    let on_time = distinct_for_period(
        pool,
        scope,
        first,
        last,
        "kind = 'entry' AND status = 'on_time'",
    )
    .await?;
    let late =
        distinct_for_period(pool, scope, first, last, "kind = 'entry' AND status = 'late'").await?;
    let sick = distinct_for_period(pool, scope, first, last, "status = 'sick'").await?;
    let leave = distinct_for_period(pool, scope, first, last, "status = 'leave'").await?;

    // Over a period, Absent reports only stored override rows; the derived
    // figure is a daily concept with no meaningful period analogue.
    let absent = distinct_for_period(pool, scope, first, last, "status = 'absent'").await?;

    Ok(StatusCounts {
        total,
        on_time,
        late,
        sick,
        leave,
        absent,
    })
}

pub async fn period_summary(
    pool: &MySqlPool,
    year: i32,
    month: u32,
) -> Result<PeriodSummary, sqlx::Error> {
    let (first, last) = month_bounds(year, month).unwrap_or_else(|| {
        let today = chrono::Local::now().date_naive();
        (today, today)
    });

    let students = population_period(pool, PersonScope::Students, first, last).await?;
    let employees = population_period(pool, PersonScope::Employees, first, last).await?;

    Ok(PeriodSummary {
        month,
        year,
        students,
        employees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn absent_is_zero_while_the_day_is_in_progress() {
        assert_eq!(derive_absent(100, 3, t(7, 30), t(8, 0)), 0);
        assert_eq!(derive_absent(100, 3, t(8, 0), t(8, 0)), 0);
    }

    #[test]
    fn absent_is_the_unrecorded_remainder_after_cutoff() {
        assert_eq!(derive_absent(100, 37, t(8, 1), t(8, 0)), 63);
    }

    #[test]
    fn absent_clamps_at_zero() {
        assert_eq!(derive_absent(10, 15, t(9, 0), t(8, 0)), 0);
    }

    #[test]
    fn cutoff_prefers_late_cutoff_then_entry_close_then_default() {
        let mut window = AttendanceWindow {
            entry_open: t(7, 0),
            entry_close: t(7, 30),
            late_cutoff: Some(t(8, 0)),
            exit_open: t(13, 0),
            exit_close: t(14, 0),
        };
        assert_eq!(absent_cutoff(Some(&window)), t(8, 0));

        window.late_cutoff = None;
        assert_eq!(absent_cutoff(Some(&window)), t(7, 30));

        assert_eq!(absent_cutoff(None), t(8, 0));
    }
}
