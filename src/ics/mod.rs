//! iCalendar output.
//!
//! Turns schedule entries into one RFC 5545 calendar document.

mod generate;
mod timezone;

pub use generate::{event_uid, EventSerializer, PRODID};
