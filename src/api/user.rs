use crate::auth::auth::AuthUser;
use crate::service::hierarchy::OrgChart;
use crate::utils::chain_cache;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: u64,
    #[schema(example = "Jane Smith")]
    pub name: String,
    #[schema(example = "jane.smith@example.com")]
    pub email: String,
    #[schema(example = 0)]
    pub role_id: u8,
    #[schema(example = 1)]
    pub department_id: u64,
    #[schema(example = 7, nullable = true)]
    pub manager_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignManagerReq {
    #[schema(example = 7, nullable = true)]
    /// NULL clears the reporting line
    pub manager_id: Option<u64>,
}

const USER_SELECT: &str =
    "SELECT id, name, email, role_id, department_id, manager_id FROM users";

/// User directory
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sql = format!("{USER_SELECT} ORDER BY id");
    let users = sqlx::query_as::<_, UserResponse>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch users");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(users))
}

/// Single user
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to fetch")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_user(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    let sql = format!("{USER_SELECT} WHERE id = ?");
    let user = sqlx::query_as::<_, UserResponse>(&sql)
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to fetch user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        }))),
    }
}

/* =========================
Assign manager (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/manager",
    params(
        ("user_id" = u64, Path, description = "ID of the user whose manager is being set")
    ),
    request_body = AssignManagerReq,
    responses(
        (status = 200, description = "Manager updated", body = Object, example = json!({
            "message": "Manager updated"
        })),
        (status = 404, description = "User not found"),
        (status = 422, description = "Assignment rejected", body = Object, example = json!({
            "errors": [{"field": "manager_id", "message": "creates a circular reference"}]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn assign_manager(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignManagerReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to look up user");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !exists {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "User not found"
        })));
    }

    if let Some(manager_id) = payload.manager_id {
        if manager_id == user_id {
            return Ok(HttpResponse::UnprocessableEntity().json(json!({
                "errors": [{"field": "manager", "message": "can't be yourself"}]
            })));
        }

        let manager_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                .bind(manager_id)
                .fetch_one(pool.get_ref())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, manager_id, "Failed to look up manager");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;

        if !manager_exists {
            return Ok(HttpResponse::UnprocessableEntity().json(json!({
                "errors": [{"field": "manager", "message": "must exist"}]
            })));
        }

        // The cycle check recomputes from current rows, never from the
        // chain cache.
        let chart = OrgChart::load(pool.get_ref()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load org chart");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        if chart.would_create_cycle(user_id, manager_id) {
            return Ok(HttpResponse::UnprocessableEntity().json(json!({
                "errors": [{"field": "manager_id", "message": "creates a circular reference"}]
            })));
        }
    }

    sqlx::query("UPDATE users SET manager_id = ? WHERE id = ?")
        .bind(payload.manager_id)
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to update manager");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // Every descendant's resolved chain may have changed.
    chain_cache::invalidate_all();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Manager updated"
    })))
}
