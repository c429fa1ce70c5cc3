use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Claims of an externally issued access token. The identity provider signs
/// HS256 tokens for the `authenticated` audience; this service only validates
/// them and reads the user id out of `sub` — there are no login routes here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
}

impl Claims {
    /// Stand-in identity used when auth is disabled in config, so local
    /// development works without a token issuer.
    fn local_user() -> Self {
        Self {
            sub: "local-user".to_string(),
            email: None,
            aud: "authenticated".to_string(),
            exp: 0,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Claims {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !state.config.auth.enabled {
        req.extensions_mut().insert(Claims::local_user());
        return Ok(next.run(req).await);
    }

    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = validate_token(bearer.token(), &state.config.auth.jwt_secret)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["authenticated"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> Claims {
        Claims {
            sub: "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d".to_string(),
            email: Some("student@example.com".to_string()),
            aud: "authenticated".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        }
    }

    #[test]
    fn test_valid_token_round_trips_claims() {
        let token = sign(&valid_claims(), SECRET);

        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d");
        assert_eq!(claims.email.as_deref(), Some("student@example.com"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = sign(&valid_claims(), "other-secret");

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let mut claims = valid_claims();
        claims.aud = "anon".to_string();
        let token = sign(&claims, SECRET);

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = valid_claims();
        claims.exp = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = sign(&claims, SECRET);

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }
}
