//! Postgres client bootstrap.
//!
//! Turns a [`config::shared::PgConnectionConfig`] into a live [`PgClient`], drives the
//! connection on a background task and classifies connection failures.

pub mod client;
pub mod error;
pub mod version;

pub use client::{PgClient, connect};
pub use error::{ConnectErrorKind, PgConnectError};
