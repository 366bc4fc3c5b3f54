pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use crate::error::AppError;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Mounts every endpoint under the enclosing scope.
///
/// `get_task_stats` must be registered before `get_task` so `/tasks/stats`
/// is not swallowed by the `/tasks/{id}` pattern.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register)
                .service(auth::me),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::get_task_stats)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/users")
                .service(users::get_users)
                .service(users::update_user_role)
                .service(users::delete_user)
                .service(users::get_user_task_count),
        );
}

/// Fallback for unmatched routes: the same JSON envelope as every error.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Route not found" }))
}

/// JSON extractor configuration turning malformed bodies into the standard
/// 400 envelope instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}
