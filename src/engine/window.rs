use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;
use thiserror::Error;

use crate::engine::error::Reject;
use crate::engine::roster;
use crate::model::attendance::{AttendanceStatus, EntryKind};
use crate::model::person::{EmployeeRole, ScanTarget};
use crate::model::shift::ShiftLabel;
use crate::model::window::{AttendanceWindow, WindowCategory};

/// Classifies a time-of-day against a window. Branch order is the tie-break
/// when ranges overlap: entry, then late entry, then exit.
pub fn classify(
    window: &AttendanceWindow,
    time: NaiveTime,
) -> Option<(EntryKind, AttendanceStatus)> {
    if window.entry_open <= time && time <= window.entry_close {
        return Some((EntryKind::Entry, AttendanceStatus::OnTime));
    }

    if let Some(cutoff) = window.late_cutoff {
        if window.entry_close < time && time <= cutoff {
            return Some((EntryKind::Entry, AttendanceStatus::Late));
        }
    }

    if window.exit_open <= time && time <= window.exit_close {
        return Some((EntryKind::Exit, AttendanceStatus::OnTime));
    }

    None
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowOrderError {
    #[error("entry window opens after it closes")]
    EntryOrder,
    #[error("late cutoff is before the entry window closes")]
    LateCutoff,
    #[error("exit window opens after it closes")]
    ExitOrder,
}

/// Write-time ordering validation. Classification does not depend on this
/// holding, but it keeps the branch-order tie-break unreachable in practice.
pub fn validate(window: &AttendanceWindow) -> Result<(), WindowOrderError> {
    if window.entry_open > window.entry_close {
        return Err(WindowOrderError::EntryOrder);
    }
    if let Some(cutoff) = window.late_cutoff {
        if cutoff < window.entry_close {
            return Err(WindowOrderError::LateCutoff);
        }
    }
    if window.exit_open > window.exit_close {
        return Err(WindowOrderError::ExitOrder);
    }
    Ok(())
}

const WINDOW_COLUMNS: &str = "entry_open, entry_close, late_cutoff, exit_open, exit_close";

pub async fn student_window(pool: &MySqlPool) -> Result<Option<AttendanceWindow>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceWindow>(&format!(
        "SELECT {WINDOW_COLUMNS} FROM student_window LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub async fn staff_window(pool: &MySqlPool) -> Result<Option<AttendanceWindow>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceWindow>(&format!(
        "SELECT {WINDOW_COLUMNS} FROM staff_window LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
}

pub async fn security_window(
    pool: &MySqlPool,
    shift: &ShiftLabel,
) -> Result<Option<AttendanceWindow>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceWindow>(&format!(
        "SELECT {WINDOW_COLUMNS} FROM security_shift_windows WHERE shift = ?"
    ))
    .bind(shift.as_str())
    .fetch_optional(pool)
    .await
}

/// Resolves the window governing a person on a date. Security personnel go
/// through the day's roster first; an unconfigured shift window rejects.
pub async fn resolve_window(
    pool: &MySqlPool,
    target: &ScanTarget,
    date: NaiveDate,
) -> Result<AttendanceWindow, Reject> {
    match target {
        ScanTarget::Student(_) => student_window(pool)
            .await?
            .ok_or(Reject::ConfigMissing(WindowCategory::Student)),
        ScanTarget::Employee(employee) => match employee.role {
            EmployeeRole::Teacher | EmployeeRole::Staff => staff_window(pool)
                .await?
                .ok_or(Reject::ConfigMissing(WindowCategory::Staff)),
            EmployeeRole::Security => {
                let shift = roster::resolve_shift(pool, employee.id, date)
                    .await?
                    .ok_or(Reject::ShiftUnscheduled)?;
                security_window(pool, &shift)
                    .await?
                    .ok_or(Reject::ConfigMissing(WindowCategory::SecurityShift(shift)))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sample_window() -> AttendanceWindow {
        AttendanceWindow {
            entry_open: t(7, 0),
            entry_close: t(7, 30),
            late_cutoff: Some(t(8, 0)),
            exit_open: t(13, 0),
            exit_close: t(14, 0),
        }
    }

    #[test]
    fn classifies_on_time_entry_inclusive_of_bounds() {
        let window = sample_window();
        assert_eq!(
            classify(&window, t(7, 0)),
            Some((EntryKind::Entry, AttendanceStatus::OnTime))
        );
        assert_eq!(
            classify(&window, t(7, 30)),
            Some((EntryKind::Entry, AttendanceStatus::OnTime))
        );
    }

    #[test]
    fn classifies_late_entry_between_close_and_cutoff() {
        let window = sample_window();
        assert_eq!(
            classify(&window, t(7, 45)),
            Some((EntryKind::Entry, AttendanceStatus::Late))
        );
        assert_eq!(
            classify(&window, t(8, 0)),
            Some((EntryKind::Entry, AttendanceStatus::Late))
        );
    }

    #[test]
    fn no_late_branch_without_cutoff() {
        let mut window = sample_window();
        window.late_cutoff = None;
        assert_eq!(classify(&window, t(7, 45)), None);
    }

    #[test]
    fn classifies_exit_and_rejects_dead_time() {
        let window = sample_window();
        assert_eq!(
            classify(&window, t(13, 30)),
            Some((EntryKind::Exit, AttendanceStatus::OnTime))
        );
        assert_eq!(classify(&window, t(9, 0)), None);
        assert_eq!(classify(&window, t(14, 1)), None);
    }

    #[test]
    fn late_entry_wins_over_an_overlapping_exit_window() {
        // Misconfigured: exit range overlaps the late range. Earlier branch wins.
        let mut window = sample_window();
        window.exit_open = t(7, 40);
        assert_eq!(
            classify(&window, t(7, 45)),
            Some((EntryKind::Entry, AttendanceStatus::Late))
        );
    }

    #[test]
    fn validation_catches_inverted_ranges() {
        let mut window = sample_window();
        window.entry_close = t(6, 0);
        assert_eq!(validate(&window), Err(WindowOrderError::EntryOrder));

        let mut window = sample_window();
        window.late_cutoff = Some(t(7, 15));
        assert_eq!(validate(&window), Err(WindowOrderError::LateCutoff));

        let mut window = sample_window();
        window.exit_close = t(12, 0);
        assert_eq!(validate(&window), Err(WindowOrderError::ExitOrder));

        assert_eq!(validate(&sample_window()), Ok(()));
    }
}
