//! Config validation with user-friendly error messages.

use crate::schema::LecternConfig;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors joined into one line, for reporting a rejected config.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &LecternConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_boot(config, &mut report);
    validate_logging(config, &mut report);
    validate_upload(config, &mut report);
    report
}

fn validate_boot(config: &LecternConfig, report: &mut ValidationReport) {
    if let Some(target) = &config.mount_target {
        let target = target.trim();
        if target.is_empty() || target == "#" {
            report.error("mountTarget", "Mount target cannot be empty");
        }
    }
    if let Some(path) = &config.manifest_path {
        if path.trim().is_empty() {
            report.error("manifestPath", "Manifest path cannot be empty");
        }
    }
    if config.verbose_diagnostics == Some(true) {
        report.warn(
            "verboseDiagnostics",
            "Verbose diagnostics are on; turn them off for production builds",
        );
    }
}

fn validate_logging(config: &LecternConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.error(
                "logging.level",
                format!("Unknown log level '{level}'. Use one of: {}", LOG_LEVELS.join(", ")),
            );
        }
    }
}

fn validate_upload(config: &LecternConfig, report: &mut ValidationReport) {
    let Some(upload) = config.upload_attachment() else { return };
    let path = "editor.uploadAttachment";

    if upload.server.trim().is_empty() {
        report.warn(
            format!("{path}.server"),
            "No upload server configured; attachments cannot be uploaded",
        );
    }
    if upload.field_name.trim().is_empty() {
        report.error(format!("{path}.fieldName"), "fieldName cannot be empty");
    }
    if upload.max_file_size == 0 {
        report.error(format!("{path}.maxFileSize"), "maxFileSize must be > 0");
    }
    if upload.timeout_ms == 0 {
        report.error(format!("{path}.timeoutMs"), "timeoutMs must be > 0");
    }
    for (i, mime) in upload.allowed_file_types.iter().enumerate() {
        match mime.split_once('/') {
            Some((top, sub)) if !top.is_empty() && !sub.is_empty() => {}
            _ => report.error(
                format!("{path}.allowedFileTypes[{i}]"),
                format!("'{mime}' is not a MIME type (expected 'type/subtype' or 'type/*')"),
            ),
        }
    }
}
