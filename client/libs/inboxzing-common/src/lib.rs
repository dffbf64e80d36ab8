//! Inboxzing Common Library
//!
//! Shared pieces for the client core crates: the collaborator error type,
//! the clock abstraction, environment configuration and logging bootstrap.

pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use error::{CollaboratorError, CollaboratorResult};
pub use telemetry::init_logging;
