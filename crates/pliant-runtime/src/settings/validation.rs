//! Settings validation.

use tracing::warn;

use super::error::{SettingsError, SettingsResult};
use super::schema::{LogOutput, LoggingSettings, Settings};

/// Validates the loaded settings.
pub fn validate_settings(settings: &Settings) -> SettingsResult<()> {
    if settings.finalize && !settings.enforce_required {
        warn!("Finalize hooks will run without required-field enforcement");
    }
    validate_logging(&settings.logging)
}

fn validate_logging(logging: &LoggingSettings) -> SettingsResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(SettingsError::validation(
            "logging.output is 'file' but logging.file_path is not set",
        ));
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(SettingsError::validation(format!(
                "Invalid logging filter target: '{target}'"
            )));
        }
    }

    Ok(())
}
