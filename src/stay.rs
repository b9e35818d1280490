//! Stay pricing: nights between two dates times the nightly rate.

use chrono::NaiveDate;

/// Longest stay that can be booked in one reservation.
pub const MAX_NIGHTS: i64 = 365;

/// Nights and total price for a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayQuote {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub nightly_rate: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayError {
    /// Check-out is on or before check-in
    CheckOutNotAfterCheckIn,
    /// Check-in is before today
    CheckInInPast,
    /// More than `MAX_NIGHTS` nights
    TooLong { nights: i64 },
}

impl std::fmt::Display for StayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StayError::CheckOutNotAfterCheckIn => {
                write!(f, "La fecha de salida debe ser posterior a la fecha de entrada")
            }
            StayError::CheckInInPast => write!(f, "No se pueden hacer reservas en fechas pasadas"),
            StayError::TooLong { nights } => write!(
                f,
                "No se pueden hacer reservas por más de un año ({} noches)",
                nights
            ),
        }
    }
}

impl std::error::Error for StayError {}

impl StayQuote {
    /// Price a stay for booking. `today` is the first bookable date.
    pub fn new(
        check_in: NaiveDate,
        check_out: NaiveDate,
        nightly_rate: u64,
        today: NaiveDate,
    ) -> Result<Self, StayError> {
        if check_out <= check_in {
            return Err(StayError::CheckOutNotAfterCheckIn);
        }
        if check_in < today {
            return Err(StayError::CheckInInPast);
        }

        let quote = Self::preview(check_in, check_out, nightly_rate);
        if quote.nights > MAX_NIGHTS {
            return Err(StayError::TooLong {
                nights: quote.nights,
            });
        }
        Ok(quote)
    }

    /// Price preview while dates are being picked: inverted or empty ranges
    /// price as zero nights instead of failing.
    pub fn preview(check_in: NaiveDate, check_out: NaiveDate, nightly_rate: u64) -> Self {
        let nights = (check_out - check_in).num_days().max(0);
        let total = nightly_rate.saturating_mul(nights as u64);
        Self {
            check_in,
            check_out,
            nights,
            nightly_rate,
            total,
        }
    }
}
