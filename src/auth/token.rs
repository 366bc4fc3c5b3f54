use crate::error::AppError;
use crate::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT.
///
/// Besides the user id, the token carries the role so the authorization
/// rules can run without a database round-trip. A role change therefore
/// takes effect when the user next logs in.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: i32,
    /// The user's role at the time the token was issued.
    pub role: Role,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Generates a JWT for the given user, valid for 24 hours.
///
/// Requires the `JWT_SECRET` environment variable for signing.
pub fn generate_token(user_id: i32, role: Role) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        role,
        exp: expiration,
    };

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))?;

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Returns `AppError::Unauthorized` when the token is malformed, the
/// signature does not match, or the token has expired.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref JWT_ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    // Helper to run test logic with a temporarily set JWT_SECRET
    fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap();

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }

    #[test]
    fn test_token_round_trip_preserves_identity_and_role() {
        run_with_temp_jwt_secret("test_secret_for_gen_verify", || {
            let token = generate_token(1, Role::Admin).unwrap();
            let claims = verify_token(&token).unwrap();
            assert_eq!(claims.sub, 1);
            assert_eq!(claims.role, Role::Admin);

            let token = generate_token(2, Role::User).unwrap();
            let claims = verify_token(&token).unwrap();
            assert_eq!(claims.role, Role::User);
        });
    }

    #[test]
    fn test_expired_token_is_rejected() {
        run_with_temp_jwt_secret("test_secret_for_expiration", || {
            let expiration = chrono::Utc::now()
                .checked_sub_signed(chrono::Duration::hours(2))
                .expect("valid timestamp")
                .timestamp() as usize;

            let claims_expired = Claims {
                sub: 2,
                role: Role::User,
                exp: expiration,
            };
            let expired_token = encode(
                &Header::default(),
                &claims_expired,
                &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
            )
            .unwrap();

            match verify_token(&expired_token) {
                Err(AppError::Unauthorized(msg)) => {
                    assert!(msg.contains("Invalid token"));
                }
                Ok(_) => panic!("Token should have been invalid due to expiration"),
                Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
            }
        });
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        run_with_temp_jwt_secret("first_secret", || {
            let token = generate_token(3, Role::User).unwrap();
            std::env::set_var("JWT_SECRET", "a_completely_different_secret");
            match verify_token(&token) {
                Err(AppError::Unauthorized(msg)) => assert!(msg.contains("Invalid token")),
                Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
                Err(e) => panic!("Unexpected error type: {:?}", e),
            }
        });
    }
}
