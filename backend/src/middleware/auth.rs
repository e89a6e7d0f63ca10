//! Authentication middleware
//!
//! Verifies the bearer JWT on every protected route and places the acting
//! user in the request extensions. Tokens are issued elsewhere; this service
//! only checks them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::{Actor, Role};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate a token, returning the actor it names
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Actor, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway_secs;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    Ok(Actor::new(user_id, claims.role))
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    let actor = match verify_token(token, &state.config.jwt) {
        Ok(actor) => actor,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(actor);

    next.run(request).await
}

/// Extractor for the authenticated actor
#[derive(Clone, Copy, Debug)]
pub struct CurrentActor(pub Actor);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(CurrentActor)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            leeway_secs: 0,
        }
    }

    fn token(sub: &str, role: Role, exp_offset: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            email: "user@example.com".to_string(),
            role,
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_actor() {
        let actor = verify_token(&token("42", Role::Admin, 3600, "test-secret"), &config()).unwrap();

        assert_eq!(actor.user_id, 42);
        assert!(actor.is_admin());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let err = verify_token(&token("42", Role::Associate, -3600, "test-secret"), &config())
            .unwrap_err();

        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let err =
            verify_token(&token("42", Role::Associate, 3600, "other"), &config()).unwrap_err();

        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn non_numeric_subject_is_unauthorized() {
        let err = verify_token(&token("abc", Role::Associate, 3600, "test-secret"), &config())
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
