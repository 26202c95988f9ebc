use actix_web::{web, HttpResponse, HttpRequest};
use serde::{Deserialize, Serialize};
use tracing::{info, error};
use uuid::Uuid;

use crate::AppState;
use crate::auth::Claims;
use crate::error::{AppError, AuthError, DatabaseError};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SavePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
}

/// Access gate for protected routes.
///
/// The `Authorization` header carries the raw signed token — no scheme
/// prefix — and must verify before any handler logic runs. Absent or
/// unreadable headers and failed verification both reject with 401.
fn bearer_claims(req: &HttpRequest, state: &AppState) -> Result<Claims, AppError> {
    let token = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::AuthError(AuthError::Unauthorized))?;

    state.auth_service.decode_token(token)
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for email: {}", req.email);

    match state.auth_service.register(&req.username, &req.email, &req.password).await {
        Ok(_) => {
            info!("Registration successful for email: {}", req.email);
            Ok(HttpResponse::Created().json(MessageResponse {
                message: "User registered successfully".to_string(),
            }))
        }
        Err(e) => {
            error!("Registration failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);

    match state.auth_service.authenticate(&req.email, &req.password).await {
        Ok(token) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(AuthResponse { token }))
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

/// Protected: returns the account's public profile. The password hash
/// and saved passwords never leave the store through this route.
pub async fn profile(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = bearer_claims(&req, &state)?;
    let user_id = Uuid::parse_str(&claims.sub)?;

    // The account may have vanished between token issuance and use
    let user = state.db.get_user_by_id(user_id).await?
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        username: user.username,
        email: user.email,
    }))
}

/// Protected: appends one generated password to the account's saved list.
pub async fn save_password(
    req: HttpRequest,
    body: web::Json<SavePasswordRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let claims = bearer_claims(&req, &state)?;
    let user_id = Uuid::parse_str(&claims.sub)?;

    let user = state.db.get_user_by_id(user_id).await?
        .ok_or(AppError::DatabaseError(DatabaseError::NotFound))?;

    state.db.append_saved_password(user.id, &body.password).await?;
    info!("Saved password for user: {}", user.id);

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password saved successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppState, Settings};
    use crate::auth::AuthService;
    use crate::db::DbOperations;
    use actix_web::test::TestRequest;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::PgPool;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let config = Settings::new_for_test().expect("test config");
        let pool = Arc::new(
            PgPool::connect_lazy(&config.database.url).expect("lazy pool"),
        );
        let db = DbOperations::new(pool);
        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_hours,
        ));
        AppState {
            config: Arc::new(config),
            db,
            auth_service,
        }
    }

    fn signed_token(secret: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "alice@example.com".to_string(),
            exp: now + exp_offset_secs,
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
    fn test_gate_rejects_missing_header() {
        let state = test_state();
        let req = TestRequest::default().to_http_request();

        match bearer_claims(&req, &state) {
            Err(AppError::AuthError(AuthError::Unauthorized)) => (),
            other => panic!("Expected unauthorized, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_gate_accepts_raw_token() {
        let state = test_state();
        // Raw token value, no "Bearer " prefix — that is the wire contract
        let token = signed_token("test_secret", 3600);
        let req = TestRequest::default()
            .insert_header(("Authorization", token))
            .to_http_request();

        let claims = bearer_claims(&req, &state).unwrap();
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn test_gate_rejects_prefixed_token() {
        let state = test_state();
        let token = signed_token("test_secret", 3600);
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();

        assert!(bearer_claims(&req, &state).is_err());
    }

    #[test]
    fn test_gate_rejects_foreign_signature() {
        let state = test_state();
        let token = signed_token("some_other_secret", 3600);
        let req = TestRequest::default()
            .insert_header(("Authorization", token))
            .to_http_request();

        match bearer_claims(&req, &state) {
            Err(AppError::AuthError(AuthError::InvalidToken)) => (),
            other => panic!("Expected invalid token, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_gate_rejects_expired_token() {
        let state = test_state();
        let token = signed_token("test_secret", -3600);
        let req = TestRequest::default()
            .insert_header(("Authorization", token))
            .to_http_request();

        match bearer_claims(&req, &state) {
            Err(AppError::AuthError(AuthError::TokenExpired)) => (),
            other => panic!("Expected expired token, got {:?}", other.map(|c| c.sub)),
        }
    }
}
