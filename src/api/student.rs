use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::person::Student;
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::{identity_cache, identity_filter};

const UPDATABLE_COLUMNS: &[&str] = &["student_no", "name", "class_id", "guardian_phone"];

#[derive(Deserialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "20240101")]
    pub student_no: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = 3)]
    pub class_id: u64,
    #[schema(example = "081234567890", nullable = true)]
    pub guardian_phone: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct StudentQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
    pub class_id: Option<u64>,
    /// Case-insensitive name fragment
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// List students
#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQuery),
    responses((status = 200, body = StudentListResponse), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn list_students(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let search_pattern = query.search.as_deref().map(|s| format!("%{s}%"));

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(class_id) = query.class_id {
        where_sql.push_str(" AND class_id = ?");
        args.push(FilterValue::U64(class_id));
    }

    if let Some(pattern) = search_pattern.as_deref() {
        where_sql.push_str(" AND name LIKE ?");
        args.push(FilterValue::Str(pattern));
    }

    let count_sql = format!("SELECT COUNT(*) FROM students{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count students");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        "SELECT id, student_no, name, class_id, guardian_phone FROM students{} \
         ORDER BY name ASC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Student>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(*s),
        };
    }

    let students = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch students");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Create a student
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudent,
    responses((status = 201), (status = 400), (status = 401), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_no = payload.student_no.trim();
    if student_no.is_empty() || payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Student number and name are required."
        })));
    }

    let result = sqlx::query(
        "INSERT INTO students (student_no, name, class_id, guardian_phone) VALUES (?, ?, ?, ?)",
    )
    .bind(student_no)
    .bind(payload.name.trim())
    .bind(payload.class_id)
    .bind(&payload.guardian_phone)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            identity_filter::insert(&format!("s{}", student_no.to_lowercase()));
            Ok(HttpResponse::Created().json(json!({
                "message": format!("Student {student_no} created.")
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "A student with that number already exists."
                    })));
                }
            }
            error!(error = %e, "Failed to create student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to create the student."
            })))
        }
    }
}

async fn fetch_student(pool: &MySqlPool, id: u64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, student_no, name, class_id, guardian_phone FROM students WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Update a student (partial)
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = u64, Path, description = "Student id")),
    request_body = Object,
    responses((status = 200), (status = 400), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn update_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let Some(before) = fetch_student(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch student");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Student not found." })));
    };

    let update = build_update_sql("students", UPDATABLE_COLUMNS, &payload, "id", id)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, id, "Failed to update student");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // The scan path keys on the prefixed code; drop the stale entries and,
    // when the number changed, retire the old filter code.
    let old_code = format!("s{}", before.student_no.to_lowercase());
    identity_cache::invalidate(&old_code).await;
    if let Ok(Some(after)) = fetch_student(pool.get_ref(), id).await {
        let new_code = format!("s{}", after.student_no.to_lowercase());
        if new_code != old_code {
            identity_filter::remove(&old_code);
            identity_filter::insert(&new_code);
            identity_cache::invalidate(&new_code).await;
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Student updated." })))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = u64, Path, description = "Student id")),
    responses((status = 200), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn delete_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    let Some(student) = fetch_student(pool.get_ref(), id).await.map_err(|e| {
        error!(error = %e, id, "Failed to fetch student");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Student not found." })));
    };

    sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete student");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let code = format!("s{}", student.student_no.to_lowercase());
    identity_filter::remove(&code);
    identity_cache::invalidate(&code).await;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Student {} deleted.", student.student_no)
    })))
}
