//! # eventos-proxy
//!
//! The cached occupancy tier: reads per-event seat snapshots from Redis,
//! applies the reservation-expiry projection on the way out, and bridges
//! catalog change notifications to the backend's sync endpoint.
//!
//! ## Modules
//!
//! - [`seats`] - Seat map wire types and the pure expiry projection
//! - [`reader`] - Snapshot store trait, Redis implementation, reader
//! - [`bridge`] - Change-notification subscriber

pub mod bridge;
pub mod error;
pub mod reader;
pub mod seats;

pub use bridge::{CHANGE_CHANNEL, ChangeNotificationBridge};
pub use error::ProxyError;
pub use reader::{RedisSeatStore, SeatCacheReader, SeatStore};
pub use seats::{EXPIRY_GRACE, EventSeats, SEAT_FREE, Seat, project};
