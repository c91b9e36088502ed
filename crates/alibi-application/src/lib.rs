//! Async runtime glue for the interrogation session.
//!
//! [`SessionRunner`] owns the synchronous session and turns its effects into
//! tokio tasks; views drive it through a [`SessionHandle`].

pub mod handle;
pub mod runner;
pub mod scheduler;

pub use handle::{SessionCommand, SessionHandle};
pub use runner::SessionRunner;
pub use scheduler::TokioScheduler;
