mod base;
mod biztime;
mod connection;
mod telemetry;

pub use base::*;
pub use biztime::*;
pub use connection::*;
pub use telemetry::*;
