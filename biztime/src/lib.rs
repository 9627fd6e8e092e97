//! Database setup for BizTime.
//!
//! [`db::initialize`] opens the single connection to the `biztime` database. Process startup
//! owns the returned [`postgres::PgClient`] and hands clones of it to every consumer.

pub mod db;
pub mod error;
pub mod settings;
