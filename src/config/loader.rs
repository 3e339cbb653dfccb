//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file into a configuration without validating it.
///
/// Validation is deferred until the environment overlay has been applied,
/// since credentials usually arrive through the environment.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Overlay environment values onto a configuration.
///
/// Credentials are discovered as `<env_prefix>1`, `<env_prefix>2`, ... and
/// discovery stops at the first missing or empty index. A non-empty
/// `auth.secret_env` variable replaces the configured secret.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = config.credentials.env_prefix.clone();
    let mut discovered = 0usize;
    for index in 1.. {
        match lookup(&format!("{prefix}{index}")) {
            Some(key) if !key.is_empty() => {
                config.credentials.keys.push(key);
                discovered += 1;
            }
            _ => break,
        }
    }
    tracing::info!(
        count = discovered,
        prefix = %prefix,
        "Loaded API keys from environment variables"
    );

    if let Some(secret) = lookup(&config.auth.secret_env).filter(|s| !s.is_empty()) {
        config.auth.secret = secret;
    }
}

/// Overlay values from the real process environment.
pub fn apply_process_env(config: &mut GatewayConfig) {
    apply_env(config, |name| std::env::var(name).ok());
}

/// Load, overlay the environment and any bind override, then validate.
///
/// Without a path the built-in defaults are used as the base.
pub fn load_gateway_config(
    path: Option<&Path>,
    bind_override: Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_process_env(&mut config);
    if let Some(bind) = bind_override {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn no_keys_set() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, lookup_from(&[]));
        assert!(config.credentials.keys.is_empty());
    }

    #[test]
    fn numbered_keys_in_order() {
        let mut config = GatewayConfig::default();
        apply_env(
            &mut config,
            lookup_from(&[
                ("FIVEONEONE_API_KEY_2", "key2"),
                ("FIVEONEONE_API_KEY_1", "key1"),
                ("FIVEONEONE_API_KEY_3", "key3"),
            ]),
        );
        assert_eq!(config.credentials.keys, vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn discovery_stops_at_first_gap() {
        let mut config = GatewayConfig::default();
        apply_env(
            &mut config,
            lookup_from(&[
                ("FIVEONEONE_API_KEY_1", "key1"),
                ("FIVEONEONE_API_KEY_2", ""),
                ("FIVEONEONE_API_KEY_3", "key3"),
            ]),
        );
        assert_eq!(config.credentials.keys, vec!["key1"]);
    }

    #[test]
    fn env_keys_extend_file_keys() {
        let mut config = GatewayConfig::default();
        config.credentials.keys = vec!["from-file".into()];
        config.credentials.env_prefix = "KEY_".into();
        apply_env(&mut config, lookup_from(&[("KEY_1", "from-env")]));
        assert_eq!(config.credentials.keys, vec!["from-file", "from-env"]);
    }

    #[test]
    fn secret_env_overrides_file() {
        let mut config = GatewayConfig::default();
        config.auth.secret = "file-secret".into();
        apply_env(&mut config, lookup_from(&[("GATEWAY_SECRET", "env-secret")]));
        assert_eq!(config.auth.secret, "env-secret");

        apply_env(&mut config, lookup_from(&[("GATEWAY_SECRET", "")]));
        assert_eq!(config.auth.secret, "env-secret");
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [upstream]
            base_url = "http://127.0.0.1:9000/"

            [cache]
            ttl_secs = 30
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.cache.ttl_secs, 30);
        assert_eq!(config.cache.sweep_interval_secs, 600);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache\nttl_secs = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn validation_error_lists_every_problem() {
        let err = ConfigError::Validation(vec![
            ValidationError::ZeroBurst,
            ValidationError::ZeroTtl,
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: credentials.burst_size must be at least 1, cache.ttl_secs must be greater than zero"
        );
    }

    #[test]
    fn bind_override_is_validated() {
        let errors = match load_gateway_config(None, Some("not-an-addr".into())) {
            Err(ConfigError::Validation(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        };
        assert!(errors.contains(&ValidationError::InvalidBindAddress(
            "not-an-addr".into()
        )));
    }
}
