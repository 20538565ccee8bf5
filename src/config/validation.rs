//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Validation is a pure
//! function that reports every problem it finds, not just the first.

use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use url::{Host, Url};

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("origin address is empty; set ORIGIN_SERVER or [origin].address")]
    MissingOrigin,
    #[error("origin address {address:?} is not a valid URL: {reason}")]
    InvalidOrigin { address: String, reason: String },
    #[error("origin address {0:?} must use the http scheme")]
    UnsupportedOriginScheme(String),
    #[error("origin address {0:?} must not carry a query or fragment")]
    OriginHasQuery(String),
    #[error("listen host {0:?} is not a valid host name or IP address")]
    InvalidListenHost(String),
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("origin.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
    #[error("metrics address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_origin(&config.origin.address, &mut errors);

    let host = &config.listener.host;
    if host.parse::<IpAddr>().is_err() && Host::parse(host).is_err() {
        errors.push(ValidationError::InvalidListenHost(config.listener.host.clone()));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("deadline_ms", timeouts.deadline_ms),
        ("read_secs", timeouts.read_secs),
        ("write_secs", timeouts.write_secs),
        ("connect_secs", timeouts.connect_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if config.origin.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_origin(address: &str, errors: &mut Vec<ValidationError>) {
    if address.trim().is_empty() {
        errors.push(ValidationError::MissingOrigin);
        return;
    }

    match Url::parse(address) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(ValidationError::UnsupportedOriginScheme(address.to_string()));
            }
            if url.query().is_some() || url.fragment().is_some() {
                errors.push(ValidationError::OriginHasQuery(address.to_string()));
            }
        }
        Err(e) => errors.push(ValidationError::InvalidOrigin {
            address: address.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.origin.address = "http://127.0.0.1:9000".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_missing_origin_rejected() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingOrigin]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.origin.address = "https://images.example.com?x=1".into();
        config.timeouts.deadline_ms = 0;
        config.listener.host = "not a host".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsupportedOriginScheme(
            "https://images.example.com?x=1".into()
        )));
        assert!(errors.contains(&ValidationError::OriginHasQuery(
            "https://images.example.com?x=1".into()
        )));
        assert!(errors.contains(&ValidationError::ZeroTimeout("deadline_ms")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidListenHost(_))));
    }

    #[test]
    fn test_listen_host_accepts_names_and_bare_ipv6() {
        for host in ["0.0.0.0", "localhost", "::", "::1", "[::1]"] {
            let mut config = valid();
            config.listener.host = host.into();
            assert_eq!(validate_config(&config), Ok(()), "host {}", host);
        }
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMetricsAddress("nowhere".into())]
        );
    }
}
