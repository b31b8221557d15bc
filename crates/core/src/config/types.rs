use serde::{Deserialize, Deserializer, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::acquisition::AcquisitionConfig;
use crate::paths::PathMapping;
use crate::switch::SwitchConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub plex: PlexConfig,
    pub opensubtitles: OpenSubtitlesConfig,
    /// Acquisition policy (languages, upgrades, retries).
    #[serde(default)]
    pub subtitles: AcquisitionConfig,
    #[serde(default)]
    pub switch: SwitchConfig,
    /// Ordered remote -> local prefix rules; the first match wins.
    #[serde(
        default = "default_path_mappings",
        deserialize_with = "deserialize_path_mappings"
    )]
    pub path_mappings: Vec<PathMapping>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path Plex posts webhooks to.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    9000
}

fn default_webhook_path() -> String {
    "/plexsubs".to_string()
}

/// Plex Media Server connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlexConfig {
    #[serde(default = "default_plex_url")]
    pub url: String,
    /// X-Plex-Token
    pub token: String,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u32,
}

fn default_plex_url() -> String {
    "http://localhost:32400".to_string()
}

fn default_request_timeout() -> u32 {
    10
}

/// OpenSubtitles REST API credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenSubtitlesConfig {
    pub api_key: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_opensubtitles_url")]
    pub base_url: String,
    /// Timeout for login/search calls in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u32,
    /// Timeout for file downloads in seconds (default: 30)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_opensubtitles_url() -> String {
    "https://api.opensubtitles.com/api/v1".to_string()
}

fn default_download_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    "PlexSubtitleWebhook/2.0".to_string()
}

/// Library discovery and path validation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Check path mappings once at startup and log the result.
    #[serde(default)]
    pub validate_on_startup: bool,
    /// Remote path used for validation instead of sampling libraries.
    #[serde(default)]
    pub test_file: Option<String>,
    /// Local directories searched when suggesting mappings.
    #[serde(default = "default_local_roots")]
    pub local_roots: Vec<PathBuf>,
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
    /// Files sampled per movie/show library.
    #[serde(default = "default_samples_per_library")]
    pub samples_per_library: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_on_startup: false,
            test_file: None,
            local_roots: default_local_roots(),
            scan_depth: default_scan_depth(),
            samples_per_library: default_samples_per_library(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_local_roots() -> Vec<PathBuf> {
    ["/mnt", "/media", "/data", "/volume", "/srv"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

fn default_scan_depth() -> usize {
    6
}

fn default_samples_per_library() -> usize {
    3
}

fn default_path_mappings() -> Vec<PathMapping> {
    vec![PathMapping::new("/media", "/mnt/library")]
}

/// Accepts an array of `{ remote, local }` tables or the compact
/// `"/remote:/local,..."` string used by `PLEXSUBS_PATH_MAPPINGS`.
fn deserialize_path_mappings<'de, D>(deserializer: D) -> Result<Vec<PathMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Table(Vec<PathMapping>),
        Compact(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Table(mappings) => Ok(mappings),
        Repr::Compact(s) => PathMapping::parse_list(&s).map_err(serde::de::Error::custom),
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub plex: SanitizedPlexConfig,
    pub opensubtitles: SanitizedOpenSubtitlesConfig,
    pub subtitles: AcquisitionConfig,
    pub switch: SwitchConfig,
    pub path_mappings: Vec<PathMapping>,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlexConfig {
    pub url: String,
    pub token_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOpenSubtitlesConfig {
    pub base_url: String,
    pub username: String,
    pub api_key_configured: bool,
    pub password_configured: bool,
    pub timeout_secs: u32,
    pub download_timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            plex: SanitizedPlexConfig {
                url: config.plex.url.clone(),
                token_configured: !config.plex.token.is_empty(),
                timeout_secs: config.plex.timeout_secs,
            },
            opensubtitles: SanitizedOpenSubtitlesConfig {
                base_url: config.opensubtitles.base_url.clone(),
                username: config.opensubtitles.username.clone(),
                api_key_configured: !config.opensubtitles.api_key.is_empty(),
                password_configured: !config.opensubtitles.password.is_empty(),
                timeout_secs: config.opensubtitles.timeout_secs,
                download_timeout_secs: config.opensubtitles.download_timeout_secs,
            },
            subtitles: config.subtitles.clone(),
            switch: config.switch.clone(),
            path_mappings: config.path_mappings.clone(),
            discovery: config.discovery.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[plex]
token = "abcdefghijklmnop"

[opensubtitles]
api_key = "key"
username = "user"
password = "secret"
"#;

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.server.webhook_path, "/plexsubs");
        assert_eq!(config.plex.url, "http://localhost:32400");
        assert_eq!(config.plex.timeout_secs, 10);
        assert_eq!(config.opensubtitles.download_timeout_secs, 30);
        assert_eq!(config.subtitles.languages.primary(), "en");
        assert!(config.subtitles.auto_select);
        assert_eq!(config.switch.timeout_secs, 20);
        assert_eq!(
            config.path_mappings,
            vec![PathMapping::new("/media", "/mnt/library")]
        );
        assert!(config.discovery.enabled);
        assert!(!config.discovery.validate_on_startup);
        assert_eq!(config.discovery.local_roots.len(), 5);
    }

    #[test]
    fn test_deserialize_ordered_path_mappings() {
        let toml = format!(
            r#"{MINIMAL}
[[path_mappings]]
remote = "/media/movies"
local = "/mnt/movies"

[[path_mappings]]
remote = "/media"
local = "/mnt/library"
"#
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.path_mappings.len(), 2);
        assert_eq!(config.path_mappings[0].remote, "/media/movies");
    }

    #[test]
    fn test_deserialize_compact_path_mappings() {
        let toml = format!("path_mappings = \"/media:/mnt/library,/tv:/mnt/tv\"\n{MINIMAL}");
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            config.path_mappings,
            vec![
                PathMapping::new("/media", "/mnt/library"),
                PathMapping::new("/tv", "/mnt/tv"),
            ]
        );
    }

    #[test]
    fn test_missing_plex_section_fails() {
        let toml = r#"
[opensubtitles]
api_key = "key"
username = "user"
password = "secret"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(sanitized.plex.token_configured);
        assert!(sanitized.opensubtitles.api_key_configured);
        assert!(!json.contains("abcdefghijklmnop"));
        assert!(!json.contains("secret"));
    }
}
