//! Client session store.
//!
//! Holds the current credential and identity and keeps them in sync with
//! the persisted `token`/`user` slots. Every mutation is write-through:
//! persistence completes before memory changes and before the call returns,
//! so a failed operation leaves both exactly as they were.

use tracing::{error, info, warn};

use crate::backend::AuthBackend;
use crate::db::{Database, USER_SLOT};
use crate::error::SessionError;
use crate::identity::{Identity, ProfileUpdate, Role};
use crate::registration::Registration;
use crate::token::decode_identity;

/// Credential and identity pair. Authenticated only when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credential: Option<String>,
    identity: Option<Identity>,
}

impl Session {
    pub fn new(credential: Option<String>, identity: Option<Identity>) -> Self {
        Self {
            credential: credential.filter(|c| !c.is_empty()),
            identity,
        }
    }

    /// A session with neither credential nor identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some() && self.identity.is_some()
    }

    /// Role of the authenticated user.
    pub fn role(&self) -> Option<Role> {
        if self.is_authenticated() {
            self.identity.as_ref().map(|i| i.role)
        } else {
            None
        }
    }
}

/// Single source of truth for the logged-in user.
pub struct SessionStore<B> {
    backend: B,
    db: Database,
    session: Session,
}

impl<B: AuthBackend> SessionStore<B> {
    /// Load the persisted session.
    ///
    /// When a credential is stored without a readable identity, the identity
    /// is decoded from the credential and persisted.
    pub async fn initialize(db: Database, backend: B) -> Result<Self, SessionError> {
        let stored = db.slots().load_session().await?;

        let credential = stored.token.filter(|t| !t.is_empty());
        let mut identity = stored.user.as_deref().and_then(|raw| {
            serde_json::from_str::<Identity>(raw)
                .inspect_err(|e| warn!(error = %e, "Ignoring unreadable persisted identity"))
                .ok()
        });

        if identity.is_none() {
            if let Some(decoded) = credential.as_deref().and_then(decode_identity) {
                let user_json = serde_json::to_string(&decoded).map_err(SessionError::Encoding)?;
                db.slots().put(USER_SLOT, &user_json).await?;
                identity = Some(decoded);
            }
        }

        let session = Session::new(credential, identity);
        if let Some(role) = session.role() {
            info!(role = %role, "Restored session");
        }

        Ok(Self {
            backend,
            db,
            session,
        })
    }

    /// Close persistence. The store cannot be used afterwards.
    pub async fn dispose(self) {
        self.db.close().await;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn credential(&self) -> Option<&str> {
        self.session.credential()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Authenticate with the backend and persist the resulting session.
    ///
    /// Backend failures are returned untouched. A response without a token
    /// that decodes to an identity is `MissingCredential`; in both cases the
    /// current session is left as it was.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let response = self
            .backend
            .login(email, password)
            .await
            .map_err(SessionError::Auth)?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingCredential)?;
        let identity = decode_identity(&token).ok_or(SessionError::MissingCredential)?;

        let user_json = serde_json::to_string(&identity).map_err(SessionError::Encoding)?;
        self.db.slots().put_session(&token, &user_json).await?;

        info!(user_id = identity.id, role = %identity.role, "Logged in");
        self.session = Session::new(Some(token), Some(identity.clone()));
        Ok(identity)
    }

    /// Create an account, then log in with the same email and password.
    ///
    /// The result is the login result: a registration the backend accepted
    /// but whose login fails is still an error, and leaves no session behind.
    pub async fn register(&mut self, registration: &Registration) -> Result<Identity, SessionError> {
        self.backend
            .register(registration)
            .await
            .map_err(SessionError::Auth)?;

        info!(email = %registration.email, "Registered");
        self.login(&registration.email, &registration.password).await
    }

    /// Send a partial profile to the backend and merge it into the identity.
    ///
    /// The merge is computed locally; the backend response is not read.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<Identity, SessionError> {
        let (Some(credential), Some(current)) =
            (self.session.credential(), self.session.identity())
        else {
            return Err(SessionError::Unauthenticated);
        };

        self.backend
            .update_profile(credential, current.id, update)
            .await
            .map_err(SessionError::ProfileUpdate)?;

        let mut updated = current.clone();
        updated.apply(update);

        let user_json = serde_json::to_string(&updated).map_err(SessionError::Encoding)?;
        self.db.slots().put(USER_SLOT, &user_json).await?;

        info!(user_id = updated.id, "Profile updated");
        self.session.identity = Some(updated.clone());
        Ok(updated)
    }

    /// Forget the session in memory and in persistence. Never fails.
    pub async fn logout(&mut self) {
        if let Err(e) = self.db.slots().clear_session().await {
            error!(error = %e, "Failed to erase persisted session");
        }

        if let Some(identity) = self.session.identity() {
            info!(user_id = identity.id, "Logged out");
        }
        self.session = Session::anonymous();
    }
}
