//! Structured logging for BizTime binaries.

pub mod tracing;
