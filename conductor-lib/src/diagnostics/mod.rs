//! Telemetry helpers.

pub mod reporter;

pub use reporter::Reporter;
