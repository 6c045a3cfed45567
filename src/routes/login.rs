use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use crate::routes::helpers::{error_chain_fmt, json_error};
use crate::session_state::TypedSession;

#[derive(Clone)]
pub struct AdminPassword(pub SecretString);

#[derive(serde::Deserialize)]
pub struct LoginData {
    password: Option<SecretString>,
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Incorrect password.")]
    InvalidCredentials,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            LoginError::InvalidCredentials => json_error(self.status_code(), &self.to_string()),
            LoginError::UnexpectedError(_) => {
                json_error(self.status_code(), "An unexpected error occurred.")
            }
        }
    }
}

#[tracing::instrument(name = "Admin login", skip(body, admin_password, session))]
pub async fn login(
    body: web::Json<LoginData>,
    admin_password: web::Data<AdminPassword>,
    session: TypedSession,
) -> Result<HttpResponse, LoginError> {
    let candidate = body
        .into_inner()
        .password
        .ok_or(LoginError::InvalidCredentials)?;

    if !password_matches(&candidate, &admin_password.0) {
        return Err(LoginError::InvalidCredentials);
    }

    session.renew();
    session
        .mark_as_admin()
        .context("Failed to store the admin session")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

fn password_matches(candidate: &SecretString, expected: &SecretString) -> bool {
    let candidate = candidate.expose_secret().trim();
    !candidate.is_empty() && candidate == expected.expose_secret().trim()
}
