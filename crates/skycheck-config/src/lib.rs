//! # Skycheck Config
//!
//! Configuration management for the skycheck service.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{
    ConfigValidator, MAX_ADVERTISED_OFFSET_HOURS, ValidationError, ValidationResult,
    ValidationWarning,
};
