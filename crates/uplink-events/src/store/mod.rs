//! The [`EventStore`] facade and its pagination helpers.

pub mod cursor;
pub mod event_store;
pub mod iter;

pub use event_store::{EventStore, PageLimits};
pub use iter::EventIter;
