pub mod clock;
pub mod config;
pub mod error;
pub mod interrogator;
pub mod outcome;
pub mod session;

// Re-export common error type
pub use error::AlibiError;
pub use config::GameConfig;
