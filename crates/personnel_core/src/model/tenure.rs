//! Arrival/departure date rules.
//!
//! # Invariants
//! - When both dates are set, `departure >= arrival`.
//! - A newly assigned arrival date is never later than "today".

use chrono::{Local, NaiveDate};
use thiserror::Error;

/// Tenure validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TenureError {
    /// Arrival scheduled ahead of the current date.
    #[error("arrival date {arrival} is in the future (today is {today})")]
    ArrivalInFuture { arrival: NaiveDate, today: NaiveDate },
    /// Departure earlier than arrival.
    #[error("departure date {departure} is earlier than arrival date {arrival}")]
    DepartureBeforeArrival {
        arrival: NaiveDate,
        departure: NaiveDate,
    },
}

/// Current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Checks the ordering rule for an arrival/departure pair.
///
/// Either side may be unset; an unset departure means "still active".
pub fn check_order(
    arrival: Option<NaiveDate>,
    departure: Option<NaiveDate>,
) -> Result<(), TenureError> {
    match (arrival, departure) {
        (Some(arrival), Some(departure)) if departure < arrival => {
            Err(TenureError::DepartureBeforeArrival { arrival, departure })
        }
        _ => Ok(()),
    }
}

/// Rejects arrival dates later than `today`.
pub fn check_arrival_not_future(arrival: NaiveDate, today: NaiveDate) -> Result<(), TenureError> {
    if arrival > today {
        return Err(TenureError::ArrivalInFuture { arrival, today });
    }
    Ok(())
}
