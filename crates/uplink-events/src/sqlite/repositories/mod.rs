//! Table repositories. One table, one repository.

pub mod event;
