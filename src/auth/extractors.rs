use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::authz::Actor;
use crate::error::AppError;

/// Extracts the acting identity from request extensions.
///
/// Routes protected by `AuthMiddleware` have the verified [`Claims`] stashed
/// in extensions; this turns them into the [`Actor`] the authorization rules
/// operate on. If the claims are missing the middleware did not run, which
/// is treated as an unauthorized request.
impl FromRequest for Actor {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(Actor {
                id: claims.sub,
                role: claims.role,
            })),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_actor_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Claims {
            sub: 123,
            role: Role::Admin,
            exp: 0,
        });

        let mut payload = Payload::None;
        let actor = Actor::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(actor.id, 123);
        assert!(actor.is_admin());
    }

    #[actix_rt::test]
    async fn test_actor_extractor_without_claims_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = Actor::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let err = result.unwrap_err();
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
