//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{BroadcastConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML file.
pub const CONFIG_PATH_ENV: &str = "BROADCAST_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BroadcastConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BroadcastConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the startup configuration from the real process environment.
pub fn load_from_env() -> Result<BroadcastConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Build configuration from defaults, an optional file, then variable overrides.
///
/// `lookup` stands in for the environment so callers can supply any source.
pub fn load_with<F>(lookup: F) -> Result<BroadcastConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => BroadcastConfig::default(),
    };

    apply_overrides(&mut config, &lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay recognised variables. Malformed values leave the current setting in place.
fn apply_overrides<F>(config: &mut BroadcastConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(host) = var("BACKEND_HOST") {
        config.backend.host = host;
    }
    if let Some(port) = var("BACKEND_PORT") {
        match port.parse() {
            Ok(port) => config.backend.port = port,
            Err(_) => ignored("BACKEND_PORT", &port),
        }
    }
    if let Some(retries) = var("RETRIES") {
        match retries.parse() {
            Ok(retries) => config.dispatch.retries = retries,
            Err(_) => ignored("RETRIES", &retries),
        }
    }
    if let Some(timeout) = var("TIMEOUT") {
        match parse_duration(&timeout).filter(|d| !d.is_zero()) {
            Some(d) => config.dispatch.timeout_ms = d.as_millis().max(1) as u64,
            None => ignored("TIMEOUT", &timeout),
        }
    }
    if let Some(addr) = var("LISTEN_ADDR") {
        config.listener.bind_address = addr;
    }
    if let Some(limit) = var("MAX_BODY_BYTES") {
        match limit.parse() {
            Ok(limit) => config.listener.max_body_bytes = limit,
            Err(_) => ignored("MAX_BODY_BYTES", &limit),
        }
    }
    if let Some(format) = var("LOG_FORMAT") {
        match format.to_ascii_lowercase().as_str() {
            "json" => config.observability.log_format = LogFormat::Json,
            "pretty" => config.observability.log_format = LogFormat::Pretty,
            _ => ignored("LOG_FORMAT", &format),
        }
    }
    if let Some(addr) = var("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }
}

// Logging is not initialised yet while configuration loads.
fn ignored(key: &str, value: &str) {
    eprintln!("ignoring malformed {key}={value:?}, keeping default");
}

/// Parse a duration such as `300ms`, `3s`, `1.5m` or `1h30m`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `0` is accepted.
/// Negative durations are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total_nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3s"), Some(Duration::from_secs(3)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("10us"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));

        assert_eq!(parse_duration("3"), None);
        assert_eq!(parse_duration("-1s"), None);
        assert_eq!(parse_duration("3 seconds"), None);
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn missing_host_is_fatal() {
        let err = load_with(env(&[])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::MissingBackendHost]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_overrides_defaults() {
        let config = load_with(env(&[
            ("BACKEND_HOST", "varnish"),
            ("BACKEND_PORT", "8081"),
            ("RETRIES", "5"),
            ("TIMEOUT", "750ms"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.backend.host, "varnish");
        let policy = config.policy();
        assert_eq!(policy.port, 8081);
        assert_eq!(policy.retries, 5);
        assert_eq!(policy.timeout, Duration::from_millis(750));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let config = load_with(env(&[
            ("BACKEND_HOST", "varnish"),
            ("BACKEND_PORT", "eighty"),
            ("RETRIES", "-3"),
            ("TIMEOUT", "soon"),
        ]))
        .unwrap();

        assert_eq!(config.policy(), BroadcastConfig::default().policy());
    }

    #[test]
    fn zero_timeout_falls_back() {
        let config = load_with(env(&[("BACKEND_HOST", "varnish"), ("TIMEOUT", "0s")])).unwrap();
        assert_eq!(config.policy().timeout, Duration::from_secs(3));
    }

    #[test]
    fn file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nhost = \"from-file\"\nport = 7000\n\n[dispatch]\nretries = 0\n"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = load_with(env(&[(CONFIG_PATH_ENV, path.as_str()), ("BACKEND_PORT", "7001")])).unwrap();
        assert_eq!(config.backend.host, "from-file");
        assert_eq!(config.backend.port, 7001);
        assert_eq!(config.dispatch.retries, 0);

        assert_eq!(load_config(file.path()).unwrap().backend.port, 7000);
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = load_with(env(&[(CONFIG_PATH_ENV, "/nonexistent/broadcast.toml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
