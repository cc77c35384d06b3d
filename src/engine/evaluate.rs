use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::MySqlPool;
use tracing::{debug, warn};

use crate::engine::calendar;
use crate::engine::error::Reject;
use crate::engine::payload::{PayloadKind, ScanPayload};
use crate::engine::window::{self, classify};
use crate::model::attendance::{AttendanceStatus, DayOverride, EntryKind};
use crate::model::person::{Employee, PersonScope, ScanTarget, Student};
use crate::utils::{identity_cache, identity_filter};

/// A successfully classified and persisted scan.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub target: ScanTarget,
    pub kind: EntryKind,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Runs the full scan state machine, in strict order: payload, identity,
/// calendar exception, window resolution, classification, then the
/// transactional once-per-day-per-kind insert.
pub async fn evaluate(
    pool: &MySqlPool,
    raw_payload: &str,
    now: NaiveDateTime,
) -> Result<Evaluation, Reject> {
    let payload = ScanPayload::parse(raw_payload)?;
    let target = lookup_target(pool, &payload).await?;

    let date = now.date();
    let time = now.time();

    if let Some(reason) = calendar::is_holiday(pool, date).await? {
        return Err(Reject::HolidaySuppressed(reason));
    }

    let window = window::resolve_window(pool, &target, date).await?;
    let (kind, status) = classify(&window, time).ok_or(Reject::OutsideWindow)?;

    persist_scan(pool, &target, date, time, kind, status).await?;

    debug!(
        person = target.person_key(),
        %kind,
        %status,
        "scan recorded"
    );

    Ok(Evaluation {
        target,
        kind,
        status,
        date,
        time,
    })
}

/// Identity resolution for the scan hot path: warmed membership filter for
/// a fast negative, moka cache for a fast positive, then the database.
async fn lookup_target(pool: &MySqlPool, payload: &ScanPayload) -> Result<ScanTarget, Reject> {
    let code = payload.code();

    let unknown = || Reject::UnknownIdentity {
        scope: payload.scope_word(),
        identifier: payload.identifier.clone(),
    };

    if identity_filter::is_warmed() && !identity_filter::might_exist(&code) {
        return Err(unknown());
    }

    if let Some(target) = identity_cache::get(&code).await {
        return Ok(target);
    }

    let target = match payload.kind {
        PayloadKind::Student => sqlx::query_as::<_, Student>(
            "SELECT id, student_no, name, class_id, guardian_phone FROM students WHERE student_no = ?",
        )
        .bind(&payload.identifier)
        .fetch_optional(pool)
        .await?
        .map(ScanTarget::Student),
        PayloadKind::Employee => sqlx::query_as::<_, Employee>(
            "SELECT id, code, name, role, default_shift FROM employees WHERE code = ?",
        )
        .bind(&payload.identifier)
        .fetch_optional(pool)
        .await?
        .map(ScanTarget::Employee),
    };

    let target = target.ok_or_else(unknown)?;
    identity_cache::insert(target.clone()).await;
    Ok(target)
}

fn scope_of(target: &ScanTarget) -> PersonScope {
    match target {
        ScanTarget::Student(_) => PersonScope::Students,
        ScanTarget::Employee(_) => PersonScope::Employees,
    }
}

/// Transactional check-then-insert. The unique key on (person, date, kind)
/// is the backstop: a racing duplicate surfaces as SQLSTATE 23000 and is
/// reported exactly like the in-transaction duplicate check.
async fn persist_scan(
    pool: &MySqlPool,
    target: &ScanTarget,
    date: NaiveDate,
    time: NaiveTime,
    kind: EntryKind,
    status: AttendanceStatus,
) -> Result<(), Reject> {
    let scope = scope_of(target);
    let table = scope.attendance_table();
    let key_column = scope.key_column();

    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE {key_column} = ? AND date = ? AND kind = ?)"
    ))
    .bind(target.person_key())
    .bind(date)
    .bind(kind)
    .fetch_one(&mut *tx)
    .await?;

    if exists {
        return Err(Reject::AlreadyRecorded {
            name: target.name().to_string(),
            kind,
        });
    }

    let insert = sqlx::query(&format!(
        "INSERT INTO {table} ({key_column}, date, time, kind, status, note) VALUES (?, ?, ?, ?, ?, NULL)"
    ))
    .bind(target.person_key())
    .bind(date)
    .bind(time)
    .bind(kind)
    .bind(status)
    .execute(&mut *tx)
    .await;

    if let Err(e) = insert {
        if let sqlx::Error::Database(db_err) = &e {
            // Lost a race against a concurrent scan for the same kind.
            if db_err.code().as_deref() == Some("23000") {
                warn!(person = target.person_key(), %kind, "concurrent duplicate scan");
                return Err(Reject::AlreadyRecorded {
                    name: target.name().to_string(),
                    kind,
                });
            }
        }
        return Err(Reject::Persistence(e));
    }

    tx.commit().await?;
    Ok(())
}

/// Administrative whole-day override. Deletes every record the person has
/// for the date, then synthesizes the replacement set: an on-time entry and
/// exit pair for Present, a single other-kind record for Sick/Leave/Absent.
/// One transaction; any failure rolls the day back untouched.
pub async fn set_daily_status(
    pool: &MySqlPool,
    scope: PersonScope,
    person_key: &str,
    status: DayOverride,
    now: NaiveDateTime,
) -> Result<(), Reject> {
    let table = scope.attendance_table();
    let key_column = scope.key_column();
    let date = now.date();
    let time = now.time();

    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {table} WHERE {key_column} = ? AND date = ?"))
        .bind(person_key)
        .bind(date)
        .execute(&mut *tx)
        .await?;

    let insert_sql = format!(
        "INSERT INTO {table} ({key_column}, date, time, kind, status, note) VALUES (?, ?, ?, ?, ?, ?)"
    );

    match status {
        DayOverride::Present => {
            sqlx::query(&insert_sql)
                .bind(person_key)
                .bind(date)
                .bind(time)
                .bind(EntryKind::Entry)
                .bind(AttendanceStatus::OnTime)
                .bind("Confirmed entry")
                .execute(&mut *tx)
                .await?;
            sqlx::query(&insert_sql)
                .bind(person_key)
                .bind(date)
                .bind(time)
                .bind(EntryKind::Exit)
                .bind(AttendanceStatus::OnTime)
                .bind("Confirmed exit")
                .execute(&mut *tx)
                .await?;
        }
        DayOverride::Sick | DayOverride::Leave | DayOverride::Absent => {
            let stored = match status {
                DayOverride::Sick => AttendanceStatus::Sick,
                DayOverride::Leave => AttendanceStatus::Leave,
                _ => AttendanceStatus::Absent,
            };
            sqlx::query(&insert_sql)
                .bind(person_key)
                .bind(date)
                .bind(time)
                .bind(EntryKind::Other)
                .bind(stored)
                .bind(stored.to_string())
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}
