//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error, if any, into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Upper bound for `scheduler.advertised_offset_hours` (one year).
pub const MAX_ADVERTISED_OFFSET_HOURS: u64 = 24 * 366;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_action(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;
        if scheduler.advertised_offset_hours > MAX_ADVERTISED_OFFSET_HOURS {
            result.add_error(ValidationError::new(
                "scheduler.advertised_offset_hours",
                format!(
                    "Advertised offset cannot exceed {} hours",
                    MAX_ADVERTISED_OFFSET_HOURS
                ),
            ));
        }
        if scheduler.delay_secs > scheduler.advertised_offset_hours.saturating_mul(3600) {
            result.add_warning(ValidationWarning::new(
                "scheduler.delay_secs",
                "delay is longer than the advertised offset, scheduledFor will be earlier than the actual run",
            ));
        }
    }

    fn validate_action(config: &Config, result: &mut ValidationResult) {
        let action = &config.action;
        if action.program.trim().is_empty() {
            result.add_error(ValidationError::new(
                "action.program",
                "Program cannot be empty",
            ));
        }

        if let Some(dir) = &action.working_dir {
            if !dir.is_dir() {
                result.add_warning(ValidationWarning::new(
                    "action.working_dir",
                    format!("Working directory does not exist: {}", dir.display()),
                ));
            }
        }

        for key in action.env.keys() {
            if key.is_empty() || key.contains('=') {
                result.add_error(ValidationError::new(
                    "action.env",
                    format!("Invalid environment variable name: {:?}", key),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
