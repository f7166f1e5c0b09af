//! Mock registration and login. Tokens are real and signed, but no
//! credentials are stored or checked.

use std::sync::{Arc, LazyLock};

use axum::extract::State;
use axum::response::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

const DEFAULT_NAME: &str = "User";

#[derive(Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: UserInfo,
}

fn validate_credentials(email: &str, password: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if !RE_EMAIL.is_match(email) {
        return Err(ApiError::Unprocessable("Invalid email address".to_string()));
    }
    if password.is_empty() {
        return Err(ApiError::Unprocessable("Password is required".to_string()));
    }
    Ok(email.to_string())
}

fn issue(state: &AppState, email: String, name: String) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state.jwt.issue_pair(&email)?;
    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer",
        user: UserInfo {
            id: pair.user_id.to_string(),
            email,
            name,
        },
    }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = validate_credentials(&body.email, &body.password)?;
    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    info!("Mock registration");
    issue(&state, email, name)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = validate_credentials(&body.email, &body.password)?;

    info!("Mock login");
    issue(&state, email, DEFAULT_NAME.to_string())
}
