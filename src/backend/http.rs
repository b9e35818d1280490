//! REST implementation of the backend traits.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::{AuthBackend, BackendError, LoginResponse, ReservationBackend};
use crate::identity::ProfileUpdate;
use crate::registration::Registration;
use crate::reservation::{NewReservation, Reservation, Room};

/// Client for the hotel REST API rooted at `base` (e.g. `http://localhost:3000/api`).
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, mut base: Url) -> Self {
        // Url::join replaces the last segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::InvalidResponse(format!("Bad endpoint {}: {}", path, e)))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(BackendError::Transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = BackendError::rejected(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "Backend rejected request");
            return Err(err);
        }

        let body = response.text().await.map_err(BackendError::Transport)?;
        parse_success_body(&body)
    }
}

/// Parse a 2xx body. An empty body (201/204 replies) reads as JSON `null`.
fn parse_success_body<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    let body = match body.trim() {
        "" => "null",
        trimmed => trimmed,
    };
    serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

/// List replies: `{ "status": ..., "data": [...] }`, a bare array, or nothing.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(default = "Vec::new")]
        data: Vec<T>,
    },
    Empty(()),
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
            Listing::Empty(()) => Vec::new(),
        }
    }
}

impl AuthBackend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, BackendError> {
        let url = self.endpoint("auth/login")?;
        debug!(url = %url, "Logging in");

        let body = serde_json::json!({ "email": email, "password": password });
        self.send(self.client.post(url).json(&body)).await
    }

    async fn register(&self, registration: &Registration) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint("auth/register")?;
        debug!(url = %url, "Registering");

        self.send(self.client.post(url).json(registration)).await
    }

    async fn update_profile(
        &self,
        credential: &str,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint(&format!("auth/profile/{}", id))?;
        debug!(url = %url, "Updating profile");

        self.send(
            self.client
                .put(url)
                .bearer_auth(credential)
                .json(update),
        )
        .await
    }
}

impl ReservationBackend for HttpBackend {
    async fn rooms(&self, credential: &str) -> Result<Vec<Room>, BackendError> {
        let url = self.endpoint("rooms")?;
        debug!(url = %url, "Listing rooms");

        let listing: Listing<Room> = self.send(self.client.get(url).bearer_auth(credential)).await?;
        Ok(listing.into_items())
    }

    async fn create_reservation(
        &self,
        credential: &str,
        reservation: &NewReservation,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint("reservations")?;
        debug!(url = %url, room_id = reservation.room_id, "Creating reservation");

        self.send(self.client.post(url).bearer_auth(credential).json(reservation))
            .await
    }

    async fn reservations_for_user(
        &self,
        credential: &str,
        user_id: i64,
    ) -> Result<Vec<Reservation>, BackendError> {
        let url = self.endpoint(&format!("reservations/{}", user_id))?;
        debug!(url = %url, "Listing reservations");

        let listing: Listing<Reservation> =
            self.send(self.client.get(url).bearer_auth(credential)).await?;
        Ok(listing.into_items())
    }

    async fn cancel_reservation(
        &self,
        credential: &str,
        id: i64,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint(&format!("reservations/{}", id))?;
        debug!(url = %url, "Cancelling reservation");

        self.send(self.client.delete(url).bearer_auth(credential)).await
    }
}
