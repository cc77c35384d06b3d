use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::evaluate::set_daily_status;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DayOverride, EntryKind};
use crate::model::person::{Employee, PersonScope, Student};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordCell {
    #[schema(example = "07:12:30", value_type = String)]
    pub time: NaiveTime,
    pub status: AttendanceStatus,
    #[schema(nullable = true)]
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentDayRow {
    pub student: Student,
    #[schema(nullable = true)]
    pub entry: Option<RecordCell>,
    #[schema(nullable = true)]
    pub exit: Option<RecordCell>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeDayRow {
    pub employee: Employee,
    #[schema(nullable = true)]
    pub entry: Option<RecordCell>,
    #[schema(nullable = true)]
    pub exit: Option<RecordCell>,
}

#[derive(Deserialize, IntoParams)]
pub struct StudentDayQuery {
    /// Day to display; defaults to today.
    #[param(value_type = Option<String>, example = "2026-08-07")]
    pub date: Option<NaiveDate>,
    /// Case-insensitive name fragment.
    pub search: Option<String>,
    pub class_id: Option<u64>,
    /// Status filter; "absent" also matches persons with no entry record.
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct EmployeeDayQuery {
    #[param(value_type = Option<String>, example = "2026-08-07")]
    pub date: Option<NaiveDate>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Folds the day's raw records into per-person entry/exit cells. An
/// "other"-kind override row fills both cells, mirroring how a sick or
/// leave day displays.
fn day_cells(records: Vec<AttendanceRecord>) -> HashMap<String, (Option<RecordCell>, Option<RecordCell>)> {
    let mut cells: HashMap<String, (Option<RecordCell>, Option<RecordCell>)> = HashMap::new();

    for record in records {
        let cell = RecordCell {
            time: record.time,
            status: record.status,
            note: record.note.clone(),
        };
        let slot = cells.entry(record.person_key.clone()).or_default();
        match record.kind {
            EntryKind::Entry => slot.0 = Some(cell),
            EntryKind::Exit => slot.1 = Some(cell),
            EntryKind::Other => {
                slot.0 = Some(cell.clone());
                slot.1 = Some(cell);
            }
        }
    }

    cells
}

fn status_matches(filter: Option<AttendanceStatus>, entry: Option<&RecordCell>) -> bool {
    match filter {
        None => true,
        Some(wanted) => match entry {
            Some(cell) => cell.status == wanted,
            // Nobody scanned and no override: only the absent filter hits.
            None => wanted == AttendanceStatus::Absent,
        },
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<AttendanceStatus>, HttpResponse> {
    match raw {
        None => Ok(None),
        Some(s) => AttendanceStatus::from_str(s).map(Some).map_err(|_| {
            HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown status filter: {s}")
            }))
        }),
    }
}

async fn fetch_day_records(
    pool: &MySqlPool,
    scope: PersonScope,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT id, {key} AS person_key, date, time, kind, status, note FROM {table} WHERE date = ?",
        key = scope.key_column(),
        table = scope.attendance_table(),
    ))
    .bind(date)
    .fetch_all(pool)
    .await
}

/// Student day view
#[utoipa::path(
    get,
    path = "/api/attendance/students",
    params(StudentDayQuery),
    responses(
        (status = 200, description = "Per-student day rows, scanned first", body = [StudentDayRow]),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn student_day_view(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentDayQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let filter = match parse_status_filter(query.status.as_deref()) {
        Ok(f) => f,
        Err(resp) => return Ok(resp),
    };

    let mut sql = String::from(
        "SELECT id, student_no, name, class_id, guardian_phone FROM students WHERE 1=1",
    );
    if query.search.is_some() {
        sql.push_str(" AND name LIKE ?");
    }
    if query.class_id.is_some() {
        sql.push_str(" AND class_id = ?");
    }
    sql.push_str(" ORDER BY name ASC");

    let mut q = sqlx::query_as::<_, Student>(&sql);
    if let Some(search) = &query.search {
        q = q.bind(format!("%{search}%"));
    }
    if let Some(class_id) = query.class_id {
        q = q.bind(class_id);
    }

    let students = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch students");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let records = fetch_day_records(pool.get_ref(), PersonScope::Students, date)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch student attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let mut cells = day_cells(records);

    let mut rows: Vec<StudentDayRow> = students
        .into_iter()
        .filter_map(|student| {
            let (entry, exit) = cells.remove(&student.student_no).unwrap_or_default();
            status_matches(filter, entry.as_ref())
                .then_some(StudentDayRow { student, entry, exit })
        })
        .collect();

    // Scanned rows first, ordered by scan time; the unscanned trail behind.
    rows.sort_by_key(|row| (row.entry.is_none(), row.entry.as_ref().map(|c| c.time)));

    Ok(HttpResponse::Ok().json(rows))
}

/// Employee day view
#[utoipa::path(
    get,
    path = "/api/attendance/employees",
    params(EmployeeDayQuery),
    responses(
        (status = 200, description = "Per-employee day rows, scanned first", body = [EmployeeDayRow]),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_day_view(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeDayQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());

    let filter = match parse_status_filter(query.status.as_deref()) {
        Ok(f) => f,
        Err(resp) => return Ok(resp),
    };

    let mut sql =
        String::from("SELECT id, code, name, role, default_shift FROM employees WHERE 1=1");
    if query.search.is_some() {
        sql.push_str(" AND name LIKE ?");
    }
    if query.role.is_some() {
        sql.push_str(" AND role = ?");
    }
    sql.push_str(" ORDER BY name ASC");

    let mut q = sqlx::query_as::<_, Employee>(&sql);
    if let Some(search) = &query.search {
        q = q.bind(format!("%{search}%"));
    }
    if let Some(role) = &query.role {
        q = q.bind(role);
    }

    let employees = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let records = fetch_day_records(pool.get_ref(), PersonScope::Employees, date)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employee attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let mut cells = day_cells(records);

    let mut rows: Vec<EmployeeDayRow> = employees
        .into_iter()
        .filter_map(|employee| {
            let (entry, exit) = cells.remove(&employee.code).unwrap_or_default();
            status_matches(filter, entry.as_ref())
                .then_some(EmployeeDayRow { employee, entry, exit })
        })
        .collect();

    rows.sort_by_key(|row| (row.entry.is_none(), row.entry.as_ref().map(|c| c.time)));

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize, ToSchema)]
pub struct OverrideReq {
    pub status: DayOverride,
}

async fn apply_override(
    auth: AuthUser,
    pool: &MySqlPool,
    scope: PersonScope,
    person_key: &str,
    status: DayOverride,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    if person_key.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Person identifier required"
        })));
    }

    let now = Local::now().naive_local();

    match set_daily_status(pool, scope, person_key, status, now).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Status for {person_key} updated to {status}.")
        }))),
        Err(e) => {
            error!(error = %e, person_key, "Failed to override daily status");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to update the attendance status."
            })))
        }
    }
}

/// Student day override
#[utoipa::path(
    post,
    path = "/api/attendance/students/{student_no}/status",
    params(("student_no" = String, Path, description = "Student number")),
    request_body = OverrideReq,
    responses(
        (status = 200, description = "Day replaced with the override records"),
        (status = 401), (status = 403),
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn override_student_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<OverrideReq>,
) -> actix_web::Result<impl Responder> {
    apply_override(
        auth,
        pool.get_ref(),
        PersonScope::Students,
        &path.into_inner(),
        payload.status,
    )
    .await
}

/// Employee day override
#[utoipa::path(
    post,
    path = "/api/attendance/employees/{code}/status",
    params(("code" = String, Path, description = "Employee code")),
    request_body = OverrideReq,
    responses(
        (status = 200, description = "Day replaced with the override records"),
        (status = 401), (status = 403),
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn override_employee_day(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<OverrideReq>,
) -> actix_web::Result<impl Responder> {
    apply_override(
        auth,
        pool.get_ref(),
        PersonScope::Employees,
        &path.into_inner(),
        payload.status,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, kind: EntryKind, status: AttendanceStatus, h: u32) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            person_key: key.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            kind,
            status,
            note: None,
        }
    }

    #[test]
    fn other_kind_records_fill_both_cells() {
        let cells = day_cells(vec![record(
            "x1",
            EntryKind::Other,
            AttendanceStatus::Sick,
            8,
        )]);
        let (entry, exit) = &cells["x1"];
        assert_eq!(entry.as_ref().unwrap().status, AttendanceStatus::Sick);
        assert_eq!(exit.as_ref().unwrap().status, AttendanceStatus::Sick);
    }

    #[test]
    fn entry_and_exit_land_in_their_own_cells() {
        let cells = day_cells(vec![
            record("x1", EntryKind::Entry, AttendanceStatus::Late, 7),
            record("x1", EntryKind::Exit, AttendanceStatus::OnTime, 14),
        ]);
        let (entry, exit) = &cells["x1"];
        assert_eq!(entry.as_ref().unwrap().status, AttendanceStatus::Late);
        assert_eq!(exit.as_ref().unwrap().status, AttendanceStatus::OnTime);
    }

    #[test]
    fn absent_filter_matches_rows_without_an_entry() {
        assert!(status_matches(Some(AttendanceStatus::Absent), None));
        assert!(!status_matches(Some(AttendanceStatus::Late), None));
        assert!(status_matches(None, None));

        let cell = RecordCell {
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            status: AttendanceStatus::Late,
            note: None,
        };
        assert!(status_matches(Some(AttendanceStatus::Late), Some(&cell)));
        assert!(!status_matches(Some(AttendanceStatus::OnTime), Some(&cell)));
    }
}
