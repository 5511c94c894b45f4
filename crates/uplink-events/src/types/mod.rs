//! Type definitions for the Uplink event store.
//!
//! - [`ConnectionEvent`]: the persisted event (id assigned by storage).
//! - [`NewEvent`]: the submission shape (id absent, `event_time` optional).
//! - [`EventFilter`] / [`PageRequest`] / [`EventPage`]: query surface.

pub mod event;
pub mod filter;

pub use event::{ConnectionEvent, NewEvent};
pub use filter::{EventFilter, EventPage, PageRequest, SortOrder};
