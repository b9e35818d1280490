//! Client core of the hotel management front-end: session handling,
//! role-based route access, stay pricing and reservations, on top of the
//! hotel REST API.

pub mod backend;
pub mod booking;
pub mod cli;
pub mod db;
pub mod error;
pub mod guard;
pub mod identity;
pub mod registration;
pub mod reservation;
pub mod session;
pub mod stay;
pub mod token;

pub use backend::{AuthBackend, BackendError, HttpBackend, LoginResponse, ReservationBackend};
pub use booking::{Booking, BookingError, ReservationDesk};
pub use error::SessionError;
pub use guard::{Decision, RouteClass, RouteRequirement, RouteTable, evaluate};
pub use identity::{Identity, ProfileUpdate, Role};
pub use registration::Registration;
pub use reservation::{Reservation, ReservationStatus, Room};
pub use session::{Session, SessionStore};
pub use token::decode_identity;
