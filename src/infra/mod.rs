//! Concrete store and credential implementations.

pub mod csv_source;
pub mod google;
