use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, LoginRequest, RegisterRequest,
    },
    authz::Actor,
    error::AppError,
    models::{Role, UserView},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new account with role `user` and returns an authentication
/// token. Duplicate email or username is rejected with 400.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let existing_email = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;
    if existing_email.is_some() {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let existing_username =
        sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE username = $1")
            .bind(&register_data.username)
            .fetch_optional(&**pool)
            .await?;
    if existing_username.is_some() {
        return Err(AppError::Validation("Username already taken".into()));
    }

    let password_hash = hash_password(&register_data.password)?;

    let (user_id, role) = sqlx::query_as::<_, (i32, Role)>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id, role",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user_id, role)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Login user
///
/// Authenticates a user by email and password and returns a token carrying
/// the user's current role.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, (i32, String, Role)>(
        "SELECT id, password_hash, role FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some((user_id, password_hash, role)) => {
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_token(user_id, role)?;
                Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

/// Current identity
///
/// Returns the authenticated user's account, credential excluded.
#[get("/me")]
pub async fn me(pool: web::Data<PgPool>, actor: Actor) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, UserView>(
        "SELECT id, username, email, role, created_at FROM users WHERE id = $1",
    )
    .bind(actor.id)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(AppError::NotFound("User not found".into())),
    }
}
