use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::roster::{self, RosterEntry};
use crate::model::person::Employee;

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    #[param(example = 8)]
    pub month: u32,
    #[param(example = 2026)]
    pub year: i32,
}

fn validate_month(month: u32, year: i32) -> Option<HttpResponse> {
    if !(1..=12).contains(&month) || year < 2023 {
        return Some(HttpResponse::BadRequest().json(json!({
            "message": "Month must be 1-12 and year 2023 or later."
        })));
    }
    None
}

#[derive(Serialize, ToSchema)]
pub struct RosterView {
    pub month: u32,
    pub year: i32,
    pub days_in_month: u32,
    pub staff: Vec<Employee>,
    /// employee id -> ISO date -> shift label.
    #[schema(value_type = Object)]
    pub schedule: HashMap<u64, HashMap<String, String>>,
}

/// Month roster view
#[utoipa::path(
    get,
    path = "/api/roster",
    params(MonthQuery),
    responses(
        (status = 200, description = "Security staff and their assignments for the month", body = RosterView),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Roster"
)]
pub async fn month_view(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> actix_web::Result<impl Responder> {
    if let Some(resp) = validate_month(query.month, query.year) {
        return Ok(resp);
    }

    let staff = sqlx::query_as::<_, Employee>(
        "SELECT id, code, name, role, default_shift FROM employees WHERE role = 'security' ORDER BY name ASC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch security staff");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let assignments = roster::fetch_month(pool.get_ref(), query.year, query.month)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch roster month");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let mut schedule: HashMap<u64, HashMap<String, String>> = HashMap::new();
    for assignment in assignments {
        schedule
            .entry(assignment.employee_id)
            .or_default()
            .insert(assignment.date.to_string(), assignment.shift);
    }

    Ok(HttpResponse::Ok().json(RosterView {
        month: query.month,
        year: query.year,
        days_in_month: roster::days_in_month(query.year, query.month),
        staff,
        schedule,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct SaveRosterReq {
    pub month: u32,
    pub year: i32,
    pub entries: Vec<RosterEntry>,
}

/// Bulk month save
#[utoipa::path(
    post,
    path = "/api/roster/save",
    request_body = SaveRosterReq,
    responses(
        (status = 200, description = "Month replaced with the submitted assignments"),
        (status = 401), (status = 403),
    ),
    security(("bearer_auth" = [])),
    tag = "Roster"
)]
pub async fn save_roster(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SaveRosterReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Some(resp) = validate_month(payload.month, payload.year) {
        return Ok(resp);
    }

    match roster::save_month(pool.get_ref(), payload.year, payload.month, &payload.entries).await {
        Ok(saved) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Roster for {}/{} saved.", payload.month, payload.year),
            "saved": saved,
        }))),
        Err(e) => {
            error!(error = %e, "Failed to save roster month");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to save the roster."
            })))
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CopyPreviousReq {
    pub month: u32,
    pub year: i32,
}

/// Copy-forward from the previous month
#[utoipa::path(
    post,
    path = "/api/roster/copy-previous",
    request_body = CopyPreviousReq,
    responses(
        (status = 200, description = "Unfilled days populated from the previous month"),
        (status = 401), (status = 403),
    ),
    security(("bearer_auth" = [])),
    tag = "Roster"
)]
pub async fn copy_previous(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CopyPreviousReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if let Some(resp) = validate_month(payload.month, payload.year) {
        return Ok(resp);
    }

    match roster::copy_previous_month(pool.get_ref(), payload.year, payload.month).await {
        Ok(copied) => Ok(HttpResponse::Ok().json(json!({
            "message": format!("Copied {copied} assignments from the previous month."),
            "copied": copied,
        }))),
        Err(e) => {
            error!(error = %e, "Failed to copy roster forward");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to copy the previous month's roster."
            })))
        }
    }
}
