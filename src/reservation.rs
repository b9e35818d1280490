//! Rooms and reservations as the hotel API sends them.
//!
//! Amounts arrive either as JSON numbers or as decimal strings (`"45000.00"`),
//! and dates either as `YYYY-MM-DD` or as a full timestamp; both are
//! normalized here.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};

/// A bookable room from `GET /rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Room {
    pub id: i64,
    #[serde(rename = "numero_habitacion", deserialize_with = "label")]
    pub number: String,
    #[serde(rename = "tipo", default)]
    pub kind: String,
    #[serde(rename = "precio_noche", deserialize_with = "amount")]
    pub nightly_rate: u64,
    #[serde(rename = "disponible", default = "available_by_default")]
    pub available: bool,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ReservationStatus {
    #[default]
    #[serde(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "cancelada")]
    Cancelled,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReservationStatus::Confirmed => "confirmada",
            ReservationStatus::Cancelled => "cancelada",
            ReservationStatus::Other => "desconocido",
        })
    }
}

/// A reservation from `GET /reservations/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reservation {
    pub id: i64,
    #[serde(rename = "id_habitacion", default)]
    pub room_id: Option<i64>,
    #[serde(rename = "fecha_inicio", deserialize_with = "date")]
    pub check_in: NaiveDate,
    #[serde(rename = "fecha_fin", deserialize_with = "date")]
    pub check_out: NaiveDate,
    #[serde(rename = "estado", default)]
    pub status: ReservationStatus,
    #[serde(default, deserialize_with = "optional_amount")]
    pub total: Option<u64>,
    #[serde(rename = "habitacion", default)]
    pub room: Option<Room>,
}

impl Reservation {
    /// Stored total, or nights times the room rate when the backend omits it.
    pub fn total(&self) -> Option<u64> {
        self.total.or_else(|| {
            self.room.as_ref().map(|room| {
                crate::stay::StayQuote::preview(self.check_in, self.check_out, room.nightly_rate)
                    .total
            })
        })
    }
}

/// Body of `POST /reservations`. The guest is taken from the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReservation {
    #[serde(rename = "id_habitacion")]
    pub room_id: i64,
    #[serde(rename = "fecha_inicio")]
    pub check_in: NaiveDate,
    #[serde(rename = "fecha_fin")]
    pub check_out: NaiveDate,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Integer(u64),
    Decimal(f64),
    Text(String),
}

impl RawAmount {
    fn whole(self) -> Result<u64, String> {
        let value = match self {
            RawAmount::Integer(n) => return Ok(n),
            RawAmount::Decimal(f) => f,
            RawAmount::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid amount {:?}: {}", s, e))?,
        };
        if value.is_finite() && value >= 0.0 {
            Ok(value.round() as u64)
        } else {
            Err(format!("invalid amount {}", value))
        }
    }
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    RawAmount::deserialize(deserializer)?
        .whole()
        .map_err(de::Error::custom)
}

fn optional_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<RawAmount>::deserialize(deserializer)?
        .map(RawAmount::whole)
        .transpose()
        .map_err(de::Error::custom)
}

fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLabel {
        Number(i64),
        Text(String),
    }

    Ok(match RawLabel::deserialize(deserializer)? {
        RawLabel::Number(n) => n.to_string(),
        RawLabel::Text(s) => s,
    })
}

fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| de::Error::custom(format!("invalid date {:?}: {}", raw, e)))
}
