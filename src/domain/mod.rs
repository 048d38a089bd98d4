//! Domain layer: models, ports, and errors for the feed cache.

pub mod errors;
pub mod models;
pub mod ports;
