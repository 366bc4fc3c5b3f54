use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use taskhub::auth::AuthMiddleware;
use taskhub::routes;

/// Connects to the test database, running migrations first.
///
/// Returns `None` when `DATABASE_URL` is not set so callers can skip instead
/// of failing on machines without Postgres.
pub async fn try_pool() -> Option<PgPool> {
    dotenv::dotenv().ok();
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "taskhub-test-secret");
    }
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test DB");
    Some(pool)
}

/// Builds the application exactly as `main.rs` does.
pub async fn init_app(
    pool: &PgPool,
) -> impl Service<
    actix_http::Request,
    Response = ServiceResponse<impl MessageBody>,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(routes::json_config())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
            .default_service(web::route().to(routes::not_found)),
    )
    .await
}

/// A registered account plus its bearer token.
pub struct TestUser {
    pub id: i32,
    pub token: String,
    pub email: String,
    pub password: String,
}

/// Suffixes a label with a random tag so parallel tests never collide on
/// the unique username/email columns.
pub fn unique(label: &str) -> String {
    format!("{}_{}", label, Uuid::new_v4().simple())
}

pub async fn register_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    label: &str,
) -> TestUser {
    let username = unique(label);
    let email = format!("{}@example.com", username);
    let password = "Password123!".to_string();

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert!(
        status.is_success(),
        "Failed to register {}: {} {}",
        label,
        status,
        String::from_utf8_lossy(&body)
    );
    let auth: serde_json::Value = serde_json::from_slice(&body).unwrap();

    TestUser {
        id: auth["userId"].as_i64().unwrap() as i32,
        token: auth["token"].as_str().unwrap().to_string(),
        email,
        password,
    }
}

pub async fn login_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "login failed for {}", email);
    let auth: serde_json::Value = test::read_body_json(resp).await;
    auth["token"].as_str().unwrap().to_string()
}

/// Flips the account to admin directly in the database, then logs in again
/// so the fresh token carries the admin role.
pub async fn make_admin(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    pool: &PgPool,
    user: &mut TestUser,
) {
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .expect("Failed to promote test user");
    user.token = login_user(app, &user.email, &user.password).await;
}
