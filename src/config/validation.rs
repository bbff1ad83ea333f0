//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and required paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FileConfig → Result<(), Vec<ValidationError>>
//! - The bind address is not checked here; binding reports it

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FileConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),

    #[error("listener.max_header_bytes must be greater than zero")]
    ZeroMaxHeaderBytes,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(tls) = &config.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    if config.listener.max_header_bytes == Some(0) {
        errors.push(ValidationError::ZeroMaxHeaderBytes);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FileConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = FileConfig::default();
        config.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: " ".into(),
        });
        config.listener.max_header_bytes = Some(0);
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-addr".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyTlsPath("cert_path"),
                ValidationError::EmptyTlsPath("key_path"),
                ValidationError::ZeroMaxHeaderBytes,
                ValidationError::InvalidMetricsAddress("not-an-addr".into()),
            ]
        );
    }
}
