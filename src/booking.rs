//! Reservation desk: list rooms, book a stay, list and cancel the
//! logged-in user's reservations.
//!
//! Every call is gated by the same route table the front-end uses, so an
//! operation is available exactly when its page is. Bookings are priced and
//! date-checked locally before anything is sent.

use chrono::NaiveDate;
use tracing::info;

use crate::backend::{AuthBackend, BackendError, ReservationBackend};
use crate::guard::{Decision, RouteTable};
use crate::identity::Identity;
use crate::reservation::{NewReservation, Reservation, Room};
use crate::session::SessionStore;
use crate::stay::{StayError, StayQuote};

/// Page listing rooms; booking starts there.
pub const ROOMS_PATH: &str = "/habitaciones";

/// Page listing the user's own reservations.
pub const MY_RESERVATIONS_PATH: &str = "/reservas/mis-reservas";

#[derive(Debug)]
pub enum BookingError {
    /// The session may not open the page behind the operation
    Denied(Decision),
    /// Reserving needs a document number and a phone on the profile
    IncompleteProfile,
    UnknownRoom(i64),
    RoomUnavailable { number: String },
    Stay(StayError),
    Backend(BackendError),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Denied(Decision::RedirectLogin) => write!(f, "Debe iniciar sesión"),
            BookingError::Denied(_) => write!(f, "No tiene acceso a esta sección"),
            BookingError::IncompleteProfile => write!(
                f,
                "Necesitas completar tu perfil (DNI y teléfono) antes de hacer una reserva"
            ),
            BookingError::UnknownRoom(id) => write!(f, "La habitación {} no existe", id),
            BookingError::RoomUnavailable { number } => {
                write!(f, "La habitación #{} no está disponible", number)
            }
            BookingError::Stay(e) => write!(f, "{}", e),
            BookingError::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BookingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookingError::Stay(e) => Some(e),
            BookingError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

/// A reservation the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Id assigned by the backend, when its reply carries one
    pub reservation_id: Option<i64>,
    pub room: Room,
    pub quote: StayQuote,
}

pub struct ReservationDesk<'a, B> {
    store: &'a SessionStore<B>,
    routes: RouteTable,
}

impl<'a, B: AuthBackend + ReservationBackend> ReservationDesk<'a, B> {
    pub fn new(store: &'a SessionStore<B>) -> Self {
        Self {
            store,
            routes: RouteTable::hotel(),
        }
    }

    fn authorize(&self, path: &str) -> Result<(&'a str, &'a Identity), BookingError> {
        let store = self.store;
        let decision = self.routes.check(store.session(), path);
        if !decision.is_allowed() {
            return Err(BookingError::Denied(decision));
        }

        match (store.credential(), store.identity()) {
            (Some(credential), Some(identity)) => Ok((credential, identity)),
            _ => Err(BookingError::Denied(Decision::RedirectLogin)),
        }
    }

    pub async fn rooms(&self) -> Result<Vec<Room>, BookingError> {
        let (credential, _) = self.authorize(ROOMS_PATH)?;
        self.store
            .backend()
            .rooms(credential)
            .await
            .map_err(BookingError::Backend)
    }

    /// Book `room_id` for the given nights. `today` is the first bookable date.
    pub async fn book(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let (credential, identity) = self.authorize(ROOMS_PATH)?;
        if identity.document_id.is_none() || identity.phone.is_none() {
            return Err(BookingError::IncompleteProfile);
        }

        let room = self
            .rooms()
            .await?
            .into_iter()
            .find(|room| room.id == room_id)
            .ok_or(BookingError::UnknownRoom(room_id))?;
        if !room.available {
            return Err(BookingError::RoomUnavailable {
                number: room.number,
            });
        }

        let quote = StayQuote::new(check_in, check_out, room.nightly_rate, today)
            .map_err(BookingError::Stay)?;

        let request = NewReservation {
            room_id,
            check_in,
            check_out,
        };
        let reply = self
            .store
            .backend()
            .create_reservation(credential, &request)
            .await
            .map_err(BookingError::Backend)?;

        let reservation_id = reply.pointer("/data/id").and_then(|id| id.as_i64());
        info!(
            user_id = identity.id,
            room_id,
            nights = quote.nights,
            reservation_id,
            "Reservation created"
        );

        Ok(Booking {
            reservation_id,
            room,
            quote,
        })
    }

    /// Reservations of the logged-in user.
    pub async fn my_reservations(&self) -> Result<Vec<Reservation>, BookingError> {
        let (credential, identity) = self.authorize(MY_RESERVATIONS_PATH)?;
        self.store
            .backend()
            .reservations_for_user(credential, identity.id)
            .await
            .map_err(BookingError::Backend)
    }

    /// Cancel a reservation. The backend decides whether it belongs to the user.
    pub async fn cancel(&self, reservation_id: i64) -> Result<(), BookingError> {
        let (credential, identity) = self.authorize(MY_RESERVATIONS_PATH)?;
        self.store
            .backend()
            .cancel_reservation(credential, reservation_id)
            .await
            .map_err(BookingError::Backend)?;

        info!(user_id = identity.id, reservation_id, "Reservation cancelled");
        Ok(())
    }
}
