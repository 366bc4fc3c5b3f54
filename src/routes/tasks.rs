use crate::{
    authz::{self, Action, Actor},
    error::AppError,
    models::{Task, TaskInput, TaskStats, TaskUpdate, TaskView, TaskViewRow},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

// Column list shared by every expanded-task query: the task row plus the
// assignee and creator summaries pulled in via LEFT JOINs, so a dangling
// reference surfaces as null rather than hiding the task.
const TASK_VIEW_SELECT: &str = "SELECT t.id, t.title, t.description, t.priority, t.status, \
     t.due_date, t.created_at, t.updated_at, \
     a.id AS assignee_id, a.username AS assignee_username, a.email AS assignee_email, \
     c.id AS creator_id, c.username AS creator_username, c.email AS creator_email \
     FROM tasks t \
     LEFT JOIN users a ON a.id = t.assigned_to \
     LEFT JOIN users c ON c.id = t.created_by";

/// Fetches the expanded view of a single task.
async fn fetch_task_view(pool: &PgPool, task_id: Uuid) -> Result<TaskView, AppError> {
    let row = sqlx::query_as::<_, TaskViewRow>(&format!("{} WHERE t.id = $1", TASK_VIEW_SELECT))
        .bind(task_id)
        .fetch_one(pool)
        .await?;
    Ok(row.into())
}

/// Fetches the raw task row, or 404.
async fn fetch_task(pool: &PgPool, task_id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, description, priority, status, due_date, assigned_to, created_by, \
         created_at, updated_at FROM tasks WHERE id = $1",
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Fetches the raw tasks visible to the actor: everything for admins, only
/// assigned tasks for regular users.
async fn fetch_visible_tasks(pool: &PgPool, actor: &Actor) -> Result<Vec<Task>, AppError> {
    const COLUMNS: &str = "SELECT id, title, description, priority, status, due_date, \
         assigned_to, created_by, created_at, updated_at FROM tasks";
    let tasks = match authz::task_scope(actor) {
        None => {
            sqlx::query_as::<_, Task>(COLUMNS)
                .fetch_all(pool)
                .await?
        }
        Some(user_id) => {
            sqlx::query_as::<_, Task>(&format!("{} WHERE assigned_to = $1", COLUMNS))
                .bind(user_id)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(tasks)
}

/// List visible tasks
///
/// Admins see every task; regular users see only tasks assigned to them.
/// Results carry expanded assignee/creator summaries, newest first.
#[get("")]
pub async fn get_tasks(pool: web::Data<PgPool>, actor: Actor) -> Result<impl Responder, AppError> {
    let order = " ORDER BY t.created_at DESC";
    let rows = match authz::task_scope(&actor) {
        None => {
            sqlx::query_as::<_, TaskViewRow>(&format!("{}{}", TASK_VIEW_SELECT, order))
                .fetch_all(&**pool)
                .await?
        }
        Some(user_id) => {
            sqlx::query_as::<_, TaskViewRow>(&format!(
                "{} WHERE t.assigned_to = $1{}",
                TASK_VIEW_SELECT, order
            ))
            .bind(user_id)
            .fetch_all(&**pool)
            .await?
        }
    };

    let tasks: Vec<TaskView> = rows.into_iter().map(TaskView::from).collect();
    Ok(HttpResponse::Ok().json(tasks))
}

/// Aggregate statistics over the visible task set
///
/// Counts are derived by scanning the same set `GET /tasks` would return,
/// at request time. Overdue means due in the past and not completed.
#[get("/stats")]
pub async fn get_task_stats(
    pool: web::Data<PgPool>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    let tasks = fetch_visible_tasks(&pool, &actor).await?;
    let stats = TaskStats::compute(&tasks, Utc::now());
    Ok(HttpResponse::Ok().json(stats))
}

/// Single task
///
/// 404 when the id is unknown, 403 when the task exists but is not visible
/// to the actor.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(&pool, task_id.into_inner()).await?;
    authz::check(&actor, Action::ViewTask(&task))?;

    let view = fetch_task_view(&pool, task.id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Create task
///
/// New tasks start as pending with medium priority unless stated otherwise.
/// The assignee defaults to the creator; naming someone else requires admin
/// and the target account must exist.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let input = task_data.into_inner();

    let assignee = input.assigned_to.unwrap_or(actor.id);
    authz::check(&actor, Action::CreateTaskFor(assignee))?;

    let assignee_exists = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE id = $1")
        .bind(assignee)
        .fetch_optional(&**pool)
        .await?;
    if assignee_exists.is_none() {
        return Err(AppError::NotFound("Assigned user not found".into()));
    }

    let task = Task::new(input, actor.id);
    sqlx::query(
        "INSERT INTO tasks (id, title, description, priority, status, due_date, assigned_to, \
         created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .bind(task.assigned_to)
    .bind(task.created_by)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&**pool)
    .await?;

    let view = fetch_task_view(&pool, task.id).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Task created successfully",
        "task": view
    })))
}

/// Partial update
///
/// Only supplied fields overwrite the stored task. An empty description is
/// a real value, not an omission. Reassignment is admin-only and silently
/// dropped for everyone else.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let mut task = fetch_task(&pool, task_id.into_inner()).await?;
    authz::check(&actor, Action::UpdateTask(&task))?;

    let allow_reassign = authz::check(&actor, Action::ReassignTask).is_ok();
    task.apply_update(task_data.into_inner(), allow_reassign);

    sqlx::query(
        "UPDATE tasks SET title = $1, description = $2, priority = $3, status = $4, \
         due_date = $5, assigned_to = $6, updated_at = $7 WHERE id = $8",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .bind(task.assigned_to)
    .bind(task.updated_at)
    .bind(task.id)
    .execute(&**pool)
    .await?;

    let view = fetch_task_view(&pool, task.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated successfully",
        "task": view
    })))
}

/// Delete task
///
/// Allowed for the creator or an admin; being the assignee is not enough.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    actor: Actor,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(&pool, task_id.into_inner()).await?;
    authz::check(&actor, Action::DeleteTask(&task))?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task.id)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
