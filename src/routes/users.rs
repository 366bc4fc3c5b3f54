use crate::{
    authz::{self, Action, Actor},
    error::AppError,
    models::{Role, UserView},
};
use actix_web::{delete, get, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    /// Requested role as sent over the wire. Parsed against the closed
    /// `{user, admin}` set so anything else yields a 400, not a 422.
    pub role: String,
}

/// List all users (admin)
///
/// Returns every account without the credential field, newest first.
#[get("")]
pub async fn get_users(pool: web::Data<PgPool>, actor: Actor) -> Result<impl Responder, AppError> {
    authz::check(&actor, Action::ManageUsers)?;

    let users = sqlx::query_as::<_, UserView>(
        "SELECT id, username, email, role, created_at FROM users ORDER BY created_at DESC",
    )
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Change a user's role (admin)
///
/// Rejects values outside `{user, admin}` with 400, leaving the stored role
/// untouched.
#[put("/{id}/role")]
pub async fn update_user_role(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
    body: web::Json<RoleUpdateRequest>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    authz::check(&actor, Action::ManageUsers)?;

    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::Validation("Invalid role".into()))?;

    let user = sqlx::query_as::<_, UserView>(
        "UPDATE users SET role = $1 WHERE id = $2 \
         RETURNING id, username, email, role, created_at",
    )
    .bind(role)
    .bind(user_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({
            "message": "User role updated successfully",
            "user": user
        }))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Delete a user and their assigned tasks (admin)
///
/// Self-deletion is a validation error. The cascade removes assigned tasks
/// first, then the account, inside one transaction so a failure between the
/// two steps cannot leave orphans.
#[delete("/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    authz::check(&actor, Action::ManageUsers)?;
    let user_id = user_id.into_inner();

    if user_id == actor.id {
        return Err(AppError::Validation("Cannot delete your own account".into()));
    }

    let exists = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&**pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM tasks WHERE assigned_to = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "User and associated tasks deleted successfully"
    })))
}

/// Count tasks assigned to a user (admin)
#[get("/{id}/task-count")]
pub async fn get_user_task_count(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    authz::check(&actor, Action::ManageUsers)?;
    let user_id = user_id.into_inner();

    let (count,) =
        sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM tasks WHERE assigned_to = $1")
            .bind(user_id)
            .fetch_one(&**pool)
            .await?;

    Ok(HttpResponse::Ok().json(json!({
        "userId": user_id,
        "taskCount": count
    })))
}
