use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::paths::PathConvention;

/// Client configuration loaded from `.wfs.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub paths: PathConvention,
    /// Media type alias or MIME string requested for operation responses.
    pub encoding: String,
    pub timeout_secs: Option<u64>,
    /// Sent as `Cache-Control: max-age` when fetching the spec document.
    pub cache_max_age: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            paths: PathConvention::Legacy,
            encoding: "application/json".to_string(),
            timeout_secs: None,
            cache_max_age: Some(300),
            user_agent: concat!("wfs-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".wfs.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ClientConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: ClientConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# wfs client configuration
paths: legacy             # legacy | current
encoding: application/json  # json | geojson | html | xml | ldjson, or a full MIME type

# timeout_secs: 30
cache_max_age: 300        # seconds, sent when fetching the OpenAPI document
# user_agent: my-agent/1.0
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.paths, PathConvention::Legacy);
        assert_eq!(config.encoding, "application/json");
        assert_eq!(config.timeout_secs, None);
        assert_eq!(config.cache_max_age, Some(300));
        assert!(config.user_agent.starts_with("wfs-client/"));
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
paths: current
encoding: geojson
timeout_secs: 10
cache_max_age: 60
user_agent: tester/0.1
"#;
        let config: ClientConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.paths, PathConvention::Current);
        assert_eq!(config.encoding, "geojson");
        assert_eq!(config.timeout_secs, Some(10));
        assert_eq!(config.cache_max_age, Some(60));
        assert_eq!(config.user_agent, "tester/0.1");
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: ClientConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        let defaults = ClientConfig::default();
        assert_eq!(config.paths, defaults.paths);
        assert_eq!(config.encoding, defaults.encoding);
        assert_eq!(config.cache_max_age, defaults.cache_max_age);
    }

    #[test]
    fn test_load_missing_and_present_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(load_config(&path).unwrap().is_none());

        fs::write(&path, "paths: current\n").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.paths, PathConvention::Current);
        assert_eq!(config.encoding, "application/json");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "paths: sideways\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.starts_with("failed to parse config"));
    }
}
