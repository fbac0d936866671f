//! Config resolution: defaults, then an optional JSON file, then environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::config::types::FanConfig;
use crate::error::StartupError;

/// Resolve the configuration from the process environment and validate it.
pub async fn load_config(path: Option<&Path>) -> Result<FanConfig, StartupError> {
    resolve_config(path, |key| std::env::var(key).ok()).await
}

/// Same as [`load_config`] with an injectable variable lookup.
pub async fn resolve_config<F>(path: Option<&Path>, lookup: F) -> Result<FanConfig, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => read_config_file(p).await?,
        None => FanConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    config.validate()?;

    debug!("Resolved configuration: {:?}", config.redacted());
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<FanConfig, StartupError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        StartupError::InvalidConfig(format!("failed to read config file {:?}: {}", path, e))
    })?;

    let config: FanConfig = serde_json::from_str(&content).map_err(|e| {
        StartupError::InvalidConfig(format!("failed to parse config file {:?}: {}", path, e))
    })?;

    info!("Loaded configuration from: {:?}", path);
    Ok(config)
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, StartupError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("{}={:?}: {}", key, raw, e)))
}

/// Environment variables override anything read from the file.
pub fn apply_env_overrides<F>(config: &mut FanConfig, lookup: F) -> Result<(), StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SENSOR_PATH") {
        config.sensor_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("DEFAULT_FAN_SPEED") {
        config.default_fan_speed = parse_var("DEFAULT_FAN_SPEED", &v)?;
    }
    if let Some(v) = lookup("MAX_FAN_SPEED") {
        config.max_fan_speed = parse_var("MAX_FAN_SPEED", &v)?;
    }
    if let Some(v) = lookup("INTERVAL") {
        config.interval_secs = parse_var("INTERVAL", &v)?;
    }
    if let Some(v) = lookup("SLOW_DOWN_INTERVAL_COUNT") {
        config.slow_down_interval_count = parse_var("SLOW_DOWN_INTERVAL_COUNT", &v)?;
    }
    if let Some(v) = lookup("CMD_TIMEOUT") {
        config.cmd_timeout_secs = parse_var("CMD_TIMEOUT", &v)?;
    }
    if let Some(v) = lookup("IPMI_TOOL_PATH") {
        config.ipmi.tool_path = v;
    }
    if let Some(v) = lookup("IPMI_USER") {
        config.ipmi.user = v;
    }
    if let Some(v) = lookup("IPMI_PASSWD") {
        config.ipmi.password = v;
    }
    if let Some(v) = lookup("IPMI_HOST") {
        config.ipmi.host = if v.trim().is_empty() { None } else { Some(v) };
    }
    if let Some(v) = lookup("IPMI_PORT") {
        config.ipmi.port = parse_var("IPMI_PORT", &v)?;
    }
    Ok(())
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

    #[tokio::test]
    async fn test_no_file_no_env_gives_defaults() {
        let config = resolve_config(None, env(&[])).await.unwrap();
        assert_eq!(config, FanConfig::default());
    }

    #[tokio::test]
    async fn test_env_overrides() {
        let config = resolve_config(
            None,
            env(&[
                ("DEFAULT_FAN_SPEED", "16"),
                ("INTERVAL", "2"),
                ("SLOW_DOWN_INTERVAL_COUNT", "5"),
                ("CMD_TIMEOUT", "4"),
                ("IPMI_USER", "admin"),
                ("IPMI_PASSWD", "secret"),
                ("IPMI_TOOL_PATH", "/usr/bin/ipmitool"),
                ("IPMI_HOST", "10.0.0.5"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(config.default_fan_speed, 16);
        assert_eq!(config.interval_secs, 2);
        assert_eq!(config.slow_down_interval_count, 5);
        assert_eq!(config.cmd_timeout_secs, 4);
        assert_eq!(config.ipmi.user, "admin");
        assert_eq!(config.ipmi.password, "secret");
        assert_eq!(config.ipmi.tool_path, "/usr/bin/ipmitool");
        assert_eq!(config.ipmi.host.as_deref(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_malformed_env_is_invalid_config() {
        let err = resolve_config(None, env(&[("INTERVAL", "six")])).await.unwrap_err();
        match err {
            StartupError::InvalidConfig(msg) => assert!(msg.contains("INTERVAL")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_env_value_failing_validation() {
        let err = resolve_config(None, env(&[("DEFAULT_FAN_SPEED", "80")])).await.unwrap_err();
        assert!(matches!(err, StartupError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"interval_secs": 12, "cmd_timeout_secs": 5, "ipmi": {{"user": "root"}}}}"#
        )
        .unwrap();

        let config = resolve_config(Some(file.path()), env(&[("CMD_TIMEOUT", "1")]))
            .await
            .unwrap();

        assert_eq!(config.interval_secs, 12);
        assert_eq!(config.cmd_timeout_secs, 1);
        assert_eq!(config.ipmi.user, "root");
        assert_eq!(config.ipmi.tool_path, "ipmitool");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = resolve_config(Some(&missing), env(&[])).await.unwrap_err();
        assert!(matches!(err, StartupError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_unparsable_file_is_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = resolve_config(Some(file.path()), env(&[])).await.unwrap_err();
        assert!(matches!(err, StartupError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_host_means_local() {
        let mut config = FanConfig::default();
        config.ipmi.host = Some("bmc".to_string());
        apply_env_overrides(&mut config, env(&[("IPMI_HOST", "")])).unwrap();
        assert_eq!(config.ipmi.host, None);
    }
}
