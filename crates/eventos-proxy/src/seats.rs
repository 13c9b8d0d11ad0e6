//! Seat map wire types and the expiry projection.
//!
//! The backend writes a seat snapshot per event into the cache; this module
//! models that snapshot and applies the read-path projection: a soft
//! reservation whose `expira` timestamp is more than the grace window in the
//! past is reported as free, with the timestamp cleared. The projection is a
//! pure function over a snapshot — the stored record is never modified, so
//! the writer remains the only writer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Reported state of a seat whose reservation lapsed.
pub const SEAT_FREE: &str = "libre";

/// How far past `expira` a reservation is still honored.
pub const EXPIRY_GRACE: Duration = Duration::from_secs(5 * 60);

/// One seat in an event's occupancy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fila: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columna: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    /// Reservation expiry, present only on soft-reserved seats.
    #[serde(
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expira: Option<OffsetDateTime>,
}

/// Occupancy snapshot for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSeats {
    #[serde(rename = "eventoId", skip_serializing_if = "Option::is_none")]
    pub evento_id: Option<i64>,
    #[serde(default)]
    pub asientos: Vec<Seat>,
}

/// Applies the expiry projection to a snapshot.
///
/// Any seat carrying an `expira` more than [`EXPIRY_GRACE`] before `now` is
/// reported `libre` with the timestamp cleared, whatever state the snapshot
/// recorded. Seats without `expira`, and reservations still inside the
/// grace window, pass through unchanged.
#[must_use]
pub fn project(mut snapshot: EventSeats, now: OffsetDateTime) -> EventSeats {
    for seat in &mut snapshot.asientos {
        let Some(expira) = seat.expira else { continue };
        let lapsed = now - expira;
        if lapsed.is_positive() && lapsed.unsigned_abs() > EXPIRY_GRACE {
            seat.estado = Some(SEAT_FREE.to_string());
            seat.expira = None;
        }
    }
    snapshot
}
