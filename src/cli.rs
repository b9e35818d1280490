//! CLI argument parsing, validation, and command dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use url::Url;

use crate::backend::{AuthBackend, ReservationBackend};
use crate::booking::{BookingError, ReservationDesk};
use crate::db::Database;
use crate::error::SessionError;
use crate::guard::{Decision, RouteTable};
use crate::identity::ProfileUpdate;
use crate::registration::{FieldError, Registration};
use crate::reservation::{Reservation, Room};
use crate::session::SessionStore;
use crate::stay::{StayError, StayQuote};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "hotel-desk",
    about = "Session and access control client for the hotel management API"
)]
pub struct Args {
    /// Base URL of the hotel REST API
    #[arg(long, env = "HOTEL_API_URL", default_value = "http://localhost:3000/api",
        value_parser = validate_api_url)]
    pub api_url: Url,

    /// Path to the SQLite file holding the session
    #[arg(short, long, env = "HOTEL_SESSION_DB", default_value = "hotel-desk.db")]
    pub database: String,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Prefer the HOTEL_PASSWORD env var over the flag
        #[arg(long, env = "HOTEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a client account and log in with it
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "HOTEL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        age: u32,
        /// National ID (DNI)
        #[arg(long)]
        document: String,
        #[arg(long)]
        phone: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Update fields of the logged-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Check whether the current session may open a front-end route
    CanAccess { path: String },
    /// Price a stay
    Quote {
        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: NaiveDate,
        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: NaiveDate,
        /// Nightly rate in pesos
        #[arg(long)]
        rate: u64,
    },
    /// List rooms with their nightly rate and availability
    Rooms,
    /// Reserve a room for the logged-in user
    Book {
        /// Room id, as listed by `rooms`
        #[arg(long)]
        room: i64,
        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: NaiveDate,
        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: NaiveDate,
    },
    /// List the logged-in user's reservations
    MyReservations,
    /// Cancel one of the logged-in user's reservations
    Cancel { id: i64 },
}

fn validate_api_url(s: &str) -> Result<Url, String> {
    let url = Url::parse(s).map_err(|e| format!("Invalid API URL {}: {}", s, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("API URL must use http or https: {}", s));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!("API URL must not have a query or fragment: {}", s));
    }

    Ok(url)
}

/// Initialize logging based on the specified format. Logs go to stderr.
pub fn init_logging(format: &LogFormat) {
    let builder = tracing_subscriber::fmt().with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Session database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open session database");
            None
        }
    }
}

/// Errors from running a command.
#[derive(Debug)]
pub enum CommandError {
    Session(SessionError),
    InvalidRegistration(Vec<FieldError>),
    EmptyProfileUpdate,
    Stay(StayError),
    Booking(BookingError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Session(e) => write!(f, "{}", e.user_message()),
            CommandError::InvalidRegistration(errors) => {
                let fields: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Invalid registration: {}", fields.join("; "))
            }
            CommandError::EmptyProfileUpdate => write!(f, "No profile fields to update"),
            CommandError::Stay(e) => write!(f, "{}", e),
            CommandError::Booking(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        CommandError::Session(e)
    }
}

impl From<BookingError> for CommandError {
    fn from(e: BookingError) -> Self {
        CommandError::Booking(e)
    }
}

/// Run one command against the store and return the text to print.
pub async fn run_command<B: AuthBackend + ReservationBackend>(
    store: &mut SessionStore<B>,
    command: Command,
    today: NaiveDate,
) -> Result<String, CommandError> {
    match command {
        Command::Login { email, password } => {
            let identity = store.login(&email, &password).await?;
            Ok(format!("Logged in as {} ({})", identity.name, identity.role))
        }
        Command::Register {
            name,
            email,
            password,
            age,
            document,
            phone,
        } => {
            let registration = Registration {
                name,
                email,
                password,
                age,
                document_id: document,
                phone,
            };
            registration
                .validate()
                .map_err(CommandError::InvalidRegistration)?;
            let identity = store.register(&registration).await?;
            Ok(format!("Registered and logged in as {} ({})", identity.name, identity.role))
        }
        Command::Logout => {
            store.logout().await;
            Ok("Logged out".to_string())
        }
        Command::Whoami => Ok(match (store.is_authenticated(), store.identity()) {
            (true, Some(identity)) => {
                format!("{} <{}> ({})", identity.name, identity.email, identity.role)
            }
            _ => "Not logged in".to_string(),
        }),
        Command::Profile {
            name,
            email,
            age,
            document,
            phone,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                age,
                document_id: document,
                phone,
            };
            if update.is_empty() {
                return Err(CommandError::EmptyProfileUpdate);
            }
            let identity = store.update_profile(&update).await?;
            Ok(format!("Profile updated for {} <{}>", identity.name, identity.email))
        }
        Command::CanAccess { path } => {
            let decision = RouteTable::hotel().check(store.session(), &path);
            Ok(describe_decision(decision))
        }
        Command::Quote {
            check_in,
            check_out,
            rate,
        } => {
            let quote =
                StayQuote::new(check_in, check_out, rate, today).map_err(CommandError::Stay)?;
            Ok(describe_quote(&quote))
        }
        Command::Rooms => {
            let rooms = ReservationDesk::new(store).rooms().await?;
            if rooms.is_empty() {
                return Ok("No hay habitaciones disponibles".to_string());
            }
            Ok(rooms.iter().map(describe_room).collect::<Vec<_>>().join("\n"))
        }
        Command::Book {
            room,
            check_in,
            check_out,
        } => {
            let booking = ReservationDesk::new(store)
                .book(room, check_in, check_out, today)
                .await?;
            let reference = match booking.reservation_id {
                Some(id) => format!("Reserva #{}", id),
                None => "Reserva".to_string(),
            };
            Ok(format!(
                "{} confirmada: habitación #{}, {}",
                reference,
                booking.room.number,
                describe_quote(&booking.quote)
            ))
        }
        Command::MyReservations => {
            let reservations = ReservationDesk::new(store).my_reservations().await?;
            if reservations.is_empty() {
                return Ok("No tienes reservas aún".to_string());
            }
            Ok(reservations
                .iter()
                .map(describe_reservation)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Cancel { id } => {
            ReservationDesk::new(store).cancel(id).await?;
            Ok(format!("Reserva #{} cancelada", id))
        }
    }
}

fn describe_quote(quote: &StayQuote) -> String {
    let unit = if quote.nights == 1 { "noche" } else { "noches" };
    format!(
        "{} {} x {} = {}",
        quote.nights,
        unit,
        format_price(quote.nightly_rate),
        format_price(quote.total)
    )
}

fn describe_room(room: &Room) -> String {
    let availability = if room.available { "disponible" } else { "ocupada" };
    format!(
        "[{}] #{} {} {}/noche ({})",
        room.id,
        room.number,
        room.kind,
        format_price(room.nightly_rate),
        availability
    )
}

fn describe_reservation(reservation: &Reservation) -> String {
    let room = reservation
        .room
        .as_ref()
        .map(|room| format!("habitación #{}", room.number))
        .unwrap_or_else(|| "habitación -".to_string());
    let total = reservation
        .total()
        .map(format_price)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "#{} {} {} a {} {} {}",
        reservation.id, room, reservation.check_in, reservation.check_out, reservation.status, total
    )
}

fn describe_decision(decision: Decision) -> String {
    match decision.redirect_target() {
        None => "allow".to_string(),
        Some(target) => format!("redirect {}", target),
    }
}

/// Whole pesos with `.` as the thousands separator, e.g. `$135.000`.
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}
