use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::engine::summary::{DailySummary, PeriodSummary, daily_summary, period_summary};

#[derive(Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Defaults to today.
    #[param(value_type = Option<String>, example = "2026-08-07")]
    pub date: Option<NaiveDate>,
}

/// Daily dashboard counts
#[utoipa::path(
    get,
    path = "/api/dashboard/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Per-population counts for the day", body = DailySummary),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn daily(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DailyQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let now = Local::now().time();

    let summary = daily_summary(pool.get_ref(), date, now).await.map_err(|e| {
        error!(error = %e, "Failed to build daily summary");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Deserialize, IntoParams)]
pub struct PeriodQuery {
    pub month: u32,
    pub year: i32,
}

/// Monthly dashboard counts
#[utoipa::path(
    get,
    path = "/api/dashboard/period",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Per-population counts for the month", body = PeriodSummary),
        (status = 400),
        (status = 401),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn period(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PeriodQuery>,
) -> actix_web::Result<impl Responder> {
    if !(1..=12).contains(&query.month) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Month must be 1-12."
        })));
    }

    let summary = period_summary(pool.get_ref(), query.year, query.month)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to build period summary");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(summary))
}
