use std::collections::HashMap;
use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::engine::calendar;
use crate::engine::window::{self, validate};
use crate::model::calendar::{Holiday, WeeklyHolidays};
use crate::model::shift::ShiftLabel;
use crate::model::window::AttendanceWindow;

/// Accepts both the "HH:MM" form the admin UI submits and the full
/// "HH:MM:SS" form, the way the original settings forms did.
fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[derive(Deserialize, ToSchema)]
pub struct WindowForm {
    #[schema(example = "07:00")]
    pub entry_open: String,
    #[schema(example = "07:30")]
    pub entry_close: String,
    #[schema(example = "08:00", nullable = true)]
    pub late_cutoff: Option<String>,
    #[schema(example = "13:00")]
    pub exit_open: String,
    #[schema(example = "14:00")]
    pub exit_close: String,
}

impl WindowForm {
    fn into_window(self) -> Result<AttendanceWindow, HttpResponse> {
        let bad = |field: &str| {
            HttpResponse::BadRequest().json(json!({
                "message": format!("Invalid time for {field}; use HH:MM.")
            }))
        };

        let late_cutoff = match &self.late_cutoff {
            None => None,
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(parse_time_of_day(s).ok_or_else(|| bad("late_cutoff"))?),
        };

        let window = AttendanceWindow {
            entry_open: parse_time_of_day(&self.entry_open).ok_or_else(|| bad("entry_open"))?,
            entry_close: parse_time_of_day(&self.entry_close).ok_or_else(|| bad("entry_close"))?,
            late_cutoff,
            exit_open: parse_time_of_day(&self.exit_open).ok_or_else(|| bad("exit_open"))?,
            exit_close: parse_time_of_day(&self.exit_close).ok_or_else(|| bad("exit_close"))?,
        };

        if let Err(e) = validate(&window) {
            return Err(HttpResponse::BadRequest().json(json!({
                "message": format!("Window rejected: {e}.")
            })));
        }

        Ok(window)
    }
}

#[derive(Serialize, ToSchema)]
pub struct WindowsView {
    #[schema(nullable = true)]
    pub student: Option<AttendanceWindow>,
    #[schema(nullable = true)]
    pub staff: Option<AttendanceWindow>,
    /// Shift label -> configured window. Missing labels are unconfigured
    /// shifts and reject scans.
    #[schema(value_type = Object)]
    pub security: HashMap<String, AttendanceWindow>,
}

/// All configured windows
#[utoipa::path(
    get,
    path = "/api/settings/windows",
    responses(
        (status = 200, body = WindowsView),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_windows(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let internal = |e: sqlx::Error| {
        error!(error = %e, "Failed to fetch windows");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    };

    let student = window::student_window(pool.get_ref()).await.map_err(internal)?;
    let staff = window::staff_window(pool.get_ref()).await.map_err(internal)?;

    #[derive(sqlx::FromRow)]
    struct ShiftWindowRow {
        shift: String,
        entry_open: NaiveTime,
        entry_close: NaiveTime,
        late_cutoff: Option<NaiveTime>,
        exit_open: NaiveTime,
        exit_close: NaiveTime,
    }

    let rows = sqlx::query_as::<_, ShiftWindowRow>(
        "SELECT shift, entry_open, entry_close, late_cutoff, exit_open, exit_close \
         FROM security_shift_windows ORDER BY shift",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(internal)?;

    let security = rows
        .into_iter()
        .map(|row| {
            (
                row.shift,
                AttendanceWindow {
                    entry_open: row.entry_open,
                    entry_close: row.entry_close,
                    late_cutoff: row.late_cutoff,
                    exit_open: row.exit_open,
                    exit_close: row.exit_close,
                },
            )
        })
        .collect();

    Ok(HttpResponse::Ok().json(WindowsView {
        student,
        staff,
        security,
    }))
}

/// Single-row window tables are replaced wholesale inside one transaction.
async fn replace_single_row_window(
    pool: &MySqlPool,
    table: &str,
    window: &AttendanceWindow,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;

    sqlx::query(&format!(
        "INSERT INTO {table} (entry_open, entry_close, late_cutoff, exit_open, exit_close) \
         VALUES (?, ?, ?, ?, ?)"
    ))
    .bind(window.entry_open)
    .bind(window.entry_close)
    .bind(window.late_cutoff)
    .bind(window.exit_open)
    .bind(window.exit_close)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

async fn put_category_window(
    auth: AuthUser,
    pool: &MySqlPool,
    table: &str,
    label: &str,
    form: WindowForm,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    let window = match form.into_window() {
        Ok(w) => w,
        Err(resp) => return Ok(resp),
    };

    match replace_single_row_window(pool, table, &window).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("{label} window saved.")
        }))),
        Err(e) => {
            error!(error = %e, table, "Failed to save window");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save the window."
            })))
        }
    }
}

/// Save the student window
#[utoipa::path(
    put,
    path = "/api/settings/windows/student",
    request_body = WindowForm,
    responses((status = 200), (status = 400), (status = 401), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_student_window(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    form: web::Json<WindowForm>,
) -> actix_web::Result<impl Responder> {
    put_category_window(auth, pool.get_ref(), "student_window", "Student", form.into_inner()).await
}

/// Save the teacher/staff window
#[utoipa::path(
    put,
    path = "/api/settings/windows/staff",
    request_body = WindowForm,
    responses((status = 200), (status = 400), (status = 401), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_staff_window(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    form: web::Json<WindowForm>,
) -> actix_web::Result<impl Responder> {
    put_category_window(auth, pool.get_ref(), "staff_window", "Teacher/staff", form.into_inner())
        .await
}

/// Save a security shift window
#[utoipa::path(
    put,
    path = "/api/settings/windows/security/{shift}",
    params(("shift" = String, Path, description = "Shift label, e.g. shift1")),
    request_body = WindowForm,
    responses((status = 200), (status = 400), (status = 401), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_security_window(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    form: web::Json<WindowForm>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let shift = ShiftLabel::new(path.into_inner());
    if shift.is_off() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "A real shift label is required."
        })));
    }

    let window = match form.into_inner().into_window() {
        Ok(w) => w,
        Err(resp) => return Ok(resp),
    };

    let existing = window::security_window(pool.get_ref(), &shift)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to check shift window");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let result = if existing.is_some() {
        sqlx::query(
            "UPDATE security_shift_windows \
             SET entry_open = ?, entry_close = ?, late_cutoff = ?, exit_open = ?, exit_close = ? \
             WHERE shift = ?",
        )
        .bind(window.entry_open)
        .bind(window.entry_close)
        .bind(window.late_cutoff)
        .bind(window.exit_open)
        .bind(window.exit_close)
        .bind(shift.as_str())
        .execute(pool.get_ref())
        .await
    } else {
        sqlx::query(
            "INSERT INTO security_shift_windows \
             (shift, entry_open, entry_close, late_cutoff, exit_open, exit_close) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(shift.as_str())
        .bind(window.entry_open)
        .bind(window.entry_close)
        .bind(window.late_cutoff)
        .bind(window.exit_open)
        .bind(window.exit_close)
        .execute(pool.get_ref())
        .await
    };

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Window for {shift} saved.")
        }))),
        Err(e) => {
            error!(error = %e, "Failed to save shift window");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save the window."
            })))
        }
    }
}

/// Reset a security shift window
#[utoipa::path(
    delete,
    path = "/api/settings/windows/security/{shift}",
    params(("shift" = String, Path, description = "Shift label")),
    responses((status = 200), (status = 401), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_security_window(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let shift = path.into_inner();
    match sqlx::query("DELETE FROM security_shift_windows WHERE shift = ?")
        .bind(&shift)
        .execute(pool.get_ref())
        .await
    {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Window for {shift} reset.")
        }))),
        Err(e) => {
            error!(error = %e, "Failed to reset shift window");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to reset the window."
            })))
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct WeeklyHolidaysReq {
    /// Lowercase weekday names, e.g. ["saturday", "sunday"].
    #[schema(example = json!(["saturday", "sunday"]))]
    pub days: Vec<String>,
}

/// Weekly holiday set
#[utoipa::path(
    get,
    path = "/api/settings/holidays/weekly",
    responses((status = 200, body = WeeklyHolidaysReq), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_weekly_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let weekly = calendar::load_weekly_holidays(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load weekly holidays");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let days: Vec<String> = weekly
        .to_setting_value()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(HttpResponse::Ok().json(WeeklyHolidaysReq { days }))
}

/// Save the weekly holiday set
#[utoipa::path(
    put,
    path = "/api/settings/holidays/weekly",
    request_body = WeeklyHolidaysReq,
    responses((status = 200), (status = 400), (status = 401), (status = 403)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_weekly_holidays(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<WeeklyHolidaysReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut days = Vec::with_capacity(payload.days.len());
    for raw in &payload.days {
        match Weekday::from_str(raw) {
            Ok(day) => days.push(day),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": format!("Unknown weekday: {raw}")
                })));
            }
        }
    }

    let set = WeeklyHolidays::new(days);
    match calendar::store_weekly_holidays(pool.get_ref(), &set).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "message": "Weekly holidays saved.",
            "days": set.to_setting_value(),
        }))),
        Err(e) => {
            error!(error = %e, "Failed to store weekly holidays");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save the weekly holidays."
            })))
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-08-17", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Independence Day")]
    pub label: String,
}

/// Dated holidays
#[utoipa::path(
    get,
    path = "/api/settings/holidays",
    responses((status = 200, body = [Holiday]), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let holidays = sqlx::query_as::<_, Holiday>(
        "SELECT id, date, label FROM holidays ORDER BY date ASC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to list holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Add a dated holiday
#[utoipa::path(
    post,
    path = "/api/settings/holidays",
    request_body = CreateHoliday,
    responses((status = 201), (status = 400), (status = 401), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.label.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Holiday label required."
        })));
    }

    let result = sqlx::query("INSERT INTO holidays (date, label) VALUES (?, ?)")
        .bind(payload.date)
        .bind(payload.label.trim())
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": format!("Holiday on {} added.", payload.date)
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "That date is already a holiday."
                    })));
                }
            }
            error!(error = %e, "Failed to add holiday");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to add the holiday."
            })))
        }
    }
}

/// Remove a dated holiday
#[utoipa::path(
    delete,
    path = "/api/settings/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday id")),
    responses((status = 200), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete holiday");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Holiday not found."
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday removed." })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minute_and_second_forms() {
        assert_eq!(
            parse_time_of_day("07:30"),
            NaiveTime::from_hms_opt(7, 30, 0)
        );
        assert_eq!(
            parse_time_of_day("07:30:15"),
            NaiveTime::from_hms_opt(7, 30, 15)
        );
        assert_eq!(parse_time_of_day("not a time"), None);
    }

    #[test]
    fn window_form_rejects_inverted_ordering() {
        let form = WindowForm {
            entry_open: "07:30".into(),
            entry_close: "07:00".into(),
            late_cutoff: None,
            exit_open: "13:00".into(),
            exit_close: "14:00".into(),
        };
        assert!(form.into_window().is_err());
    }

    #[test]
    fn blank_late_cutoff_means_no_late_branch() {
        let form = WindowForm {
            entry_open: "07:00".into(),
            entry_close: "07:30".into(),
            late_cutoff: Some("".into()),
            exit_open: "13:00".into(),
            exit_close: "14:00".into(),
        };
        let window = form.into_window().unwrap();
        assert!(window.late_cutoff.is_none());
    }
}
