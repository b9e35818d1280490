//! Backend the session and reservation desk talk to.
//!
//! `AuthBackend` and `ReservationBackend` are the seams between this crate
//! and the REST API; `HttpBackend` implements both. Failures are reported
//! as-is, nothing here retries.

mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::identity::ProfileUpdate;
use crate::registration::Registration;
use crate::reservation::{NewReservation, Reservation, Room};

pub use http::HttpBackend;

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Operations the session store delegates to the backend.
pub trait AuthBackend {
    /// `POST /auth/login`
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse, BackendError>> + Send;

    /// `POST /auth/register`
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>> + Send;

    /// `PUT /auth/profile/{id}`, authorized with the current credential.
    fn update_profile(
        &self,
        credential: &str,
        id: i64,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>> + Send;
}

/// Room and reservation operations, each authorized with the session credential.
pub trait ReservationBackend {
    /// `GET /rooms`
    fn rooms(&self, credential: &str)
    -> impl Future<Output = Result<Vec<Room>, BackendError>> + Send;

    /// `POST /reservations`
    fn create_reservation(
        &self,
        credential: &str,
        reservation: &NewReservation,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>> + Send;

    /// `GET /reservations/{user_id}`
    fn reservations_for_user(
        &self,
        credential: &str,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Reservation>, BackendError>> + Send;

    /// `DELETE /reservations/{id}`
    fn cancel_reservation(
        &self,
        credential: &str,
        id: i64,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>> + Send;
}

/// Errors reported by the backend or while talking to it.
#[derive(Debug)]
pub enum BackendError {
    /// The backend answered with a non-success status
    Rejected { status: u16, message: String },
    /// The request never got an answer
    Transport(reqwest::Error),
    /// The backend answered with a body we could not read
    InvalidResponse(String),
}

impl BackendError {
    /// Build a rejection from a response body, preferring its `message` or `error` field.
    pub fn rejected(status: u16, body: &str) -> Self {
        let from_json = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| json.get(*key)?.as_str().map(str::to_string))
            });

        let message = match from_json {
            Some(message) => message,
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => format!("Request failed with status {}", status),
        };

        BackendError::Rejected { status, message }
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Rejected { status, .. } => Some(*status),
            BackendError::Transport(e) => e.status().map(|s| s.as_u16()),
            BackendError::InvalidResponse(_) => None,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Rejected { message, .. } => write!(f, "{}", message),
            BackendError::Transport(e) => write!(f, "Backend unreachable: {}", e),
            BackendError::InvalidResponse(e) => write!(f, "Invalid backend response: {}", e),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_prefers_message_field() {
        let err = BackendError::rejected(401, r#"{"message":"Credenciales inválidas"}"#);
        assert_eq!(err.to_string(), "Credenciales inválidas");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_rejected_falls_back_to_error_field() {
        let err = BackendError::rejected(409, r#"{"error":"Email ya registrado"}"#);
        assert_eq!(err.to_string(), "Email ya registrado");
    }

    #[test]
    fn test_rejected_with_plain_or_empty_body() {
        assert_eq!(
            BackendError::rejected(502, "Bad Gateway\n").to_string(),
            "Bad Gateway"
        );
        assert_eq!(
            BackendError::rejected(500, "").to_string(),
            "Request failed with status 500"
        );
    }

    #[test]
    fn test_login_response_tolerates_missing_token() {
        let response: LoginResponse = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert!(response.token.is_none());
        assert_eq!(response.message.as_deref(), Some("ok"));
    }
}
