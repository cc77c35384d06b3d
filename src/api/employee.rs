use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::person::{Employee, EmployeeRole};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::{identity_cache, identity_filter};

const UPDATABLE_COLUMNS: &[&str] = &["code", "name", "role", "default_shift"];

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub code: String,
    #[schema(example = "John Doe")]
    pub name: String,
    pub role: EmployeeRole,
    #[schema(example = "shift1", nullable = true)]
    pub default_shift: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
    /// teacher | staff | security
    pub role: Option<String>,
    /// Case-insensitive name fragment
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

enum FilterValue<'a> {
    Str(&'a str),
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses((status = 200, body = EmployeeListResponse), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let search_pattern = query.search.as_deref().map(|s| format!("%{s}%"));

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(role) = query.role.as_deref() {
        where_sql.push_str(" AND role = ?");
        args.push(FilterValue::Str(role));
    }

    if let Some(pattern) = search_pattern.as_deref() {
        where_sql.push_str(" AND name LIKE ?");
        args.push(FilterValue::Str(pattern));
    }

    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, code, name, role, default_shift FROM employees{} \
         ORDER BY name ASC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(*s),
        };
    }

    let employees = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employees");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Create an employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses((status = 201), (status = 400), (status = 401), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let code = payload.code.trim();
    if code.is_empty() || payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Employee code and name are required."
        })));
    }

    let result = sqlx::query(
        "INSERT INTO employees (code, name, role, default_shift) VALUES (?, ?, ?, ?)",
    )
    .bind(code)
    .bind(payload.name.trim())
    .bind(payload.role)
    .bind(&payload.default_shift)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            identity_filter::insert(&format!("p{}", code.to_lowercase()));
            Ok(HttpResponse::Created().json(json!({
                "message": format!("Employee {code} created.")
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "An employee with that code already exists."
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to create the employee."
            })))
        }
    }
}

async fn fetch_employee(pool: &MySqlPool, id: u64) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "SELECT id, code, name, role, default_shift FROM employees WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Update an employee (partial)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = Object,
    responses((status = 200), (status = 400), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    // The role column is an enum on the Rust side; refuse strings that
    // would never round-trip back out of the table.
    if let Some(role) = payload.get("role").and_then(Value::as_str) {
        if EmployeeRole::from_str(role).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown role: {role}")
            })));
        }
    }

    let Some(before) = fetch_employee(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Employee not found." })));
    };

    let update = build_update_sql("employees", UPDATABLE_COLUMNS, &payload, "id", id)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, id, "Failed to update employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let old_code = format!("p{}", before.code.to_lowercase());
    identity_cache::invalidate(&old_code).await;
    if let Ok(Some(after)) = fetch_employee(pool.get_ref(), id).await {
        let new_code = format!("p{}", after.code.to_lowercase());
        if new_code != old_code {
            identity_filter::remove(&old_code);
            identity_filter::insert(&new_code);
            identity_cache::invalidate(&new_code).await;
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated." })))
}

/// Delete an employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses((status = 200), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let Some(employee) = fetch_employee(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Employee not found." })));
    };

    sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let code = format!("p{}", employee.code.to_lowercase());
    identity_filter::remove(&code);
    identity_cache::invalidate(&code).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {} deleted.", employee.code)
    })))
}
