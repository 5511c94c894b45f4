//! `SQLite` storage layer: pooling, schema bootstrap, and the event
//! repository.

pub mod connection;
pub mod migrations;
pub mod repositories;
