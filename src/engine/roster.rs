use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::model::shift::{ShiftAssignment, ShiftLabel};

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((first, last))
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month > 1 {
        (year, month - 1)
    } else {
        (year - 1, 12)
    }
}

/// One roster cell submitted by the admin editor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RosterEntry {
    pub employee_id: u64,

    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[schema(example = "shift2")]
    pub shift: String,
}

/// Resolves the shift assigned to a security employee on a date. A missing
/// row, an empty label, or an explicit "Off" all mean not scheduled.
pub async fn resolve_shift(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<ShiftLabel>, sqlx::Error> {
    let label = sqlx::query_scalar::<_, String>(
        "SELECT shift FROM shift_roster WHERE employee_id = ? AND date = ?",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(label.map(ShiftLabel::from).filter(|l| !l.is_off()))
}

pub async fn security_staff_ids(pool: &MySqlPool) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE role = 'security' ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn fetch_month(
    pool: &MySqlPool,
    year: i32,
    month: u32,
) -> Result<Vec<ShiftAssignment>, sqlx::Error> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, ShiftAssignment>(
        "SELECT id, employee_id, date, shift FROM shift_roster WHERE date BETWEEN ? AND ?",
    )
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await
}

/// Pure planning step of the copy-forward operation: for each staff member
/// and day of the target month that has no assignment yet, carry over the
/// previous month's same-day-number label when it was a real shift. Day
/// numbers the previous month never had simply produce no candidate.
pub fn plan_copy_forward(
    staff_ids: &[u64],
    prev_by_day: &HashMap<u64, HashMap<u32, String>>,
    existing: &HashSet<(u64, NaiveDate)>,
    year: i32,
    month: u32,
) -> Vec<(u64, NaiveDate, String)> {
    let mut planned = Vec::new();

    for &staff_id in staff_ids {
        let Some(prev_days) = prev_by_day.get(&staff_id) else {
            continue;
        };
        for day in 1..=days_in_month(year, month) {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if existing.contains(&(staff_id, date)) {
                continue;
            }
            if let Some(label) = prev_days.get(&day) {
                if !ShiftLabel::new(label.clone()).is_off() {
                    planned.push((staff_id, date, label.clone()));
                }
            }
        }
    }

    planned
}

/// Copies the previous month's assignments into unfilled days of the target
/// month. Additive only, one transaction, returns the number of rows copied.
pub async fn copy_previous_month(
    pool: &MySqlPool,
    year: i32,
    month: u32,
) -> Result<u64, sqlx::Error> {
    let staff_ids = security_staff_ids(pool).await?;
    let (prev_year, prev_month) = previous_month(year, month);

    let mut prev_by_day: HashMap<u64, HashMap<u32, String>> = HashMap::new();
    for row in fetch_month(pool, prev_year, prev_month).await? {
        prev_by_day
            .entry(row.employee_id)
            .or_default()
            .insert(row.date.day(), row.shift);
    }

    let existing: HashSet<(u64, NaiveDate)> = fetch_month(pool, year, month)
        .await?
        .into_iter()
        .map(|row| (row.employee_id, row.date))
        .collect();

    let planned = plan_copy_forward(&staff_ids, &prev_by_day, &existing, year, month);

    let mut tx = pool.begin().await?;
    for (employee_id, date, shift) in &planned {
        sqlx::query("INSERT INTO shift_roster (employee_id, date, shift) VALUES (?, ?, ?)")
            .bind(employee_id)
            .bind(date)
            .bind(shift)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!(year, month, copied = planned.len(), "roster copy-forward");
    Ok(planned.len() as u64)
}

/// Replaces the month's roster for the security staff set with the submitted
/// cells: delete the range, bulk-insert non-empty labels, one transaction.
pub async fn save_month(
    pool: &MySqlPool,
    year: i32,
    month: u32,
    entries: &[RosterEntry],
) -> Result<u64, sqlx::Error> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Ok(0);
    };

    let staff_ids = security_staff_ids(pool).await?;
    if staff_ids.is_empty() {
        return Ok(0);
    }
    let staff_set: HashSet<u64> = staff_ids.iter().copied().collect();

    let mut tx = pool.begin().await?;

    let placeholders = vec!["?"; staff_ids.len()].join(", ");
    let delete_sql = format!(
        "DELETE FROM shift_roster WHERE date BETWEEN ? AND ? AND employee_id IN ({placeholders})"
    );
    let mut delete = sqlx::query(&delete_sql).bind(first).bind(last);
    for id in &staff_ids {
        delete = delete.bind(id);
    }
    delete.execute(&mut *tx).await?;

    let mut saved = 0u64;
    for entry in entries {
        if !staff_set.contains(&entry.employee_id) {
            continue;
        }
        if entry.date < first || entry.date > last {
            continue;
        }
        if entry.shift.trim().is_empty() {
            continue;
        }

        sqlx::query("INSERT INTO shift_roster (employee_id, date, shift) VALUES (?, ?, ?)")
            .bind(entry.employee_id)
            .bind(entry.date)
            .bind(entry.shift.trim())
            .execute(&mut *tx)
            .await?;
        saved += 1;
    }

    tx.commit().await?;
    info!(year, month, saved, "roster month saved");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn month_lengths_honor_leap_years() {
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2026, 12), 31);
        assert_eq!(days_in_month(2026, 4), 30);
    }

    #[test]
    fn previous_month_wraps_the_year() {
        assert_eq!(previous_month(2026, 1), (2025, 12));
        assert_eq!(previous_month(2026, 8), (2026, 7));
    }

    #[test]
    fn copy_forward_fills_only_unassigned_days() {
        let staff = vec![7u64];
        let mut prev_by_day = HashMap::new();
        prev_by_day.insert(
            7u64,
            HashMap::from([
                (1u32, "shift1".to_string()),
                (2u32, "shift2".to_string()),
                (3u32, "Off".to_string()),
                (4u32, "".to_string()),
            ]),
        );
        let existing = HashSet::from([(7u64, d(2026, 8, 2))]);

        let planned = plan_copy_forward(&staff, &prev_by_day, &existing, 2026, 8);

        // Day 2 already filled, day 3 is Off, day 4 is blank: only day 1 copies.
        assert_eq!(planned, vec![(7, d(2026, 8, 1), "shift1".to_string())]);
    }

    #[test]
    fn copy_forward_skips_days_the_previous_month_never_had() {
        // February has no day 31; March day 31 must stay empty.
        let staff = vec![1u64];
        let mut prev_by_day = HashMap::new();
        prev_by_day.insert(1u64, HashMap::from([(28u32, "shift1".to_string())]));
        let existing = HashSet::new();

        let planned = plan_copy_forward(&staff, &prev_by_day, &existing, 2026, 3);

        assert_eq!(planned, vec![(1, d(2026, 3, 28), "shift1".to_string())]);
    }

    #[test]
    fn copy_forward_is_idempotent() {
        let staff = vec![5u64];
        let mut prev_by_day = HashMap::new();
        prev_by_day.insert(
            5u64,
            HashMap::from([(10u32, "shift3".to_string()), (11u32, "shift4".to_string())]),
        );

        let first_run = plan_copy_forward(&staff, &prev_by_day, &HashSet::new(), 2026, 8);
        assert_eq!(first_run.len(), 2);

        let filled: HashSet<(u64, NaiveDate)> = first_run
            .iter()
            .map(|(id, date, _)| (*id, *date))
            .collect();
        let second_run = plan_copy_forward(&staff, &prev_by_day, &filled, 2026, 8);
        assert!(second_run.is_empty());
    }

    #[test]
    fn staff_without_prior_roster_are_skipped() {
        let staff = vec![9u64];
        let planned = plan_copy_forward(&staff, &HashMap::new(), &HashSet::new(), 2026, 8);
        assert!(planned.is_empty());
    }
}
