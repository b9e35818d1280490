//! Errors surfaced by session operations.

use crate::backend::BackendError;

#[derive(Debug)]
pub enum SessionError {
    /// Login or registration rejected by the backend (passed through verbatim)
    Auth(BackendError),
    /// Login succeeded but the response carried no credential with an identity
    MissingCredential,
    /// Profile update rejected by the backend (passed through verbatim)
    ProfileUpdate(BackendError),
    /// Operation needs an authenticated session
    Unauthenticated,
    /// Persisted session could not be read or written
    Storage(sqlx::Error),
    /// Identity could not be serialized for persistence
    Encoding(serde_json::Error),
}

impl SessionError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Auth(BackendError::Rejected { message, .. })
            | SessionError::ProfileUpdate(BackendError::Rejected { message, .. }) => {
                message.clone()
            }
            SessionError::Auth(_) | SessionError::ProfileUpdate(_) => {
                "No se pudo contactar al servidor".to_string()
            }
            SessionError::MissingCredential => "Respuesta de inicio de sesión inválida".to_string(),
            SessionError::Unauthenticated => "Debe iniciar sesión".to_string(),
            SessionError::Storage(_) | SessionError::Encoding(_) => {
                "No se pudo guardar la sesión".to_string()
            }
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Auth(e) => write!(f, "Authentication failed: {}", e),
            SessionError::MissingCredential => {
                write!(f, "Login response did not contain a usable token")
            }
            SessionError::ProfileUpdate(e) => write!(f, "Profile update failed: {}", e),
            SessionError::Unauthenticated => write!(f, "Not authenticated"),
            SessionError::Storage(e) => write!(f, "Session storage error: {}", e),
            SessionError::Encoding(e) => write!(f, "Failed to encode identity: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Auth(e) | SessionError::ProfileUpdate(e) => Some(e),
            SessionError::Storage(e) => Some(e),
            SessionError::Encoding(e) => Some(e),
            SessionError::MissingCredential | SessionError::Unauthenticated => None,
        }
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        SessionError::Storage(e)
    }
}
