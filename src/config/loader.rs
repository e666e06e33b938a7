//! Configuration loading from disk and startup overrides.

use std::fs;
use std::path::Path;

use crate::config::schema::{HeaderNameSet, InvalidHeaderName, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Override error: {0}")]
    Override(#[from] InvalidHeaderName),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Startup parameters that take precedence over the config file.
///
/// Every field left as `None` keeps the file (or default) value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub origin_whitelist: Option<Vec<String>>,
    pub required_headers: Option<Vec<String>>,
    pub removed_headers: Option<Vec<String>>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of `config`.
    pub fn apply(self, config: &mut ProxyConfig) -> Result<(), ConfigError> {
        if let Some(host) = self.host {
            config.listener.host = host;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(whitelist) = self.origin_whitelist {
            config.policy.origin_whitelist = non_empty(whitelist);
        }
        if let Some(required) = self.required_headers {
            config.policy.required_headers = HeaderNameSet::parse(non_empty(required))?;
        }
        if let Some(removed) = self.removed_headers {
            config.policy.removed_headers = HeaderNameSet::parse(non_empty(removed))?;
        }
        Ok(())
    }
}

// `CORS_PROXY_REQUIRED_HEADERS=""` yields one empty element; treat it as "none".
fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Build the process configuration: defaults, then the optional file, then overrides.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    overrides.apply(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AllowOrigin;
    use axum::http::HeaderName;

    #[test]
    fn parses_partial_file_with_defaults() {
        let config = parse_config(
            r#"
            [listener]
            port = 9090

            [policy]
            origin_whitelist = ["*.example.com"]
            removed_headers = ["Cookie", "Authorization"]

            [cors]
            allow_origin = "echo"
            max_age_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.host, "localhost");
        assert_eq!(config.listener.port, 9090);
        assert_eq!(config.policy.origin_whitelist, vec!["*.example.com"]);
        assert!(config
            .policy
            .removed_headers
            .contains(&HeaderName::from_static("authorization")));
        assert!(config.policy.required_headers.contains(&HeaderName::from_static("origin")));
        assert_eq!(config.cors.allow_origin, AllowOrigin::Echo);
        assert_eq!(config.cors.max_age_secs, Some(600));
    }

    #[test]
    fn invalid_header_name_is_parse_error() {
        let err = parse_config("[policy]\nrequired_headers = [\"not valid\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err}");
    }

    #[test]
    fn validation_errors_reported() {
        let err = parse_config("[listener]\nport = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: listener.port must be between 1 and 65535"
        );
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = ConfigOverrides {
            host: Some("127.0.0.1".into()),
            port: Some(3000),
            origin_whitelist: Some(vec!["https://app.test".into()]),
            required_headers: Some(vec!["".into()]),
            removed_headers: Some(vec!["X-Secret".into()]),
        };
        let config = resolve_config(None, overrides).unwrap();

        assert_eq!(config.listener.address(), "127.0.0.1:3000");
        assert_eq!(config.policy.origin_whitelist, vec!["https://app.test"]);
        assert!(config.policy.required_headers.is_empty());
        assert!(config
            .policy
            .removed_headers
            .contains(&HeaderName::from_static("x-secret")));
        assert!(!config
            .policy
            .removed_headers
            .contains(&HeaderName::from_static("cookie")));
    }

    #[test]
    fn override_port_zero_fails_validation() {
        let overrides = ConfigOverrides {
            port: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(None, overrides),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/cors-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
