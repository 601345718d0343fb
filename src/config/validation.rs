//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the sink target is a URL and the collection name is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoggerConfig → Result<(), Vec<ValidationError>>
//! - Runs before anything is registered on a client

use thiserror::Error;
use url::Url;

use crate::config::schema::LoggerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sink target '{target}' is not a valid URL: {reason}")]
    InvalidSinkTarget { target: String, reason: String },

    #[error("collection name must not be empty")]
    EmptyCollectionName,

    #[error("collection name '{0}' contains a forbidden character")]
    ForbiddenCollectionChar(String),

    #[error("namespace must not be empty")]
    EmptyNamespace,
}

const FORBIDDEN_COLLECTION_CHARS: [char; 3] = ['/', '$', '\0'];

pub fn validate_config(config: &LoggerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Url::parse(&config.sink_target) {
        errors.push(ValidationError::InvalidSinkTarget {
            target: config.sink_target.clone(),
            reason: e.to_string(),
        });
    }

    if config.collection_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCollectionName);
    } else if config.collection_name.contains(FORBIDDEN_COLLECTION_CHARS) {
        errors.push(ValidationError::ForbiddenCollectionChar(
            config.collection_name.clone(),
        ));
    }

    if config.namespace.trim().is_empty() {
        errors.push(ValidationError::EmptyNamespace);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub(crate) fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
