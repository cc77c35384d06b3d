use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::person::SchoolClass;

#[derive(Deserialize, ToSchema)]
pub struct ClassReq {
    #[schema(example = "7A")]
    pub name: String,
}

/// List classes
#[utoipa::path(
    get,
    path = "/api/classes",
    responses((status = 200, body = [SchoolClass]), (status = 401)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn list_classes(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let classes =
        sqlx::query_as::<_, SchoolClass>("SELECT id, name FROM classes ORDER BY name ASC")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list classes");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    Ok(HttpResponse::Ok().json(classes))
}

/// Create a class
#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = ClassReq,
    responses((status = 201), (status = 400), (status = 401), (status = 403), (status = 409)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn create_class(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClassReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Class name required." })));
    }

    let result = sqlx::query("INSERT INTO classes (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": format!("Class {name} created.")
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "A class with that name already exists."
                    })));
                }
            }
            error!(error = %e, "Failed to create class");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Failed to create the class."
            })))
        }
    }
}

/// Rename a class
#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = u64, Path, description = "Class id")),
    request_body = ClassReq,
    responses((status = 200), (status = 400), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn update_class(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ClassReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();
    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Class name required." })));
    }

    let result = sqlx::query("UPDATE classes SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to rename class");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Class not found." })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Class renamed." })))
}

/// Delete a class
#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = u64, Path, description = "Class id")),
    responses((status = 200), (status = 400), (status = 401), (status = 403), (status = 404)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
pub async fn delete_class(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let id = path.into_inner();

    // Refuse while students still reference the class.
    let students = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE class_id = ?")
        .bind(id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to count class members");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if students > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Class still has {students} students; move them first.")
        })));
    }

    let result = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, id, "Failed to delete class");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Class not found." })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Class deleted." })))
}
