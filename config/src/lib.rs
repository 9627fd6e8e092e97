//! Configuration for the BizTime database bootstrap.
//!
//! Holds the fixed connection string, the typed Postgres connection config derived from it,
//! and the loader for ambient settings such as logging and TLS.

mod load;
pub mod shared;

pub use load::{LoadConfigError, load_config, load_config_from};
