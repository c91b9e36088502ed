//! Remote interrogator implementations.

pub mod http_interrogator;
mod wire;

pub use http_interrogator::HttpInterrogator;
pub use wire::{HealthStatus, SESSION_NOT_FOUND};
