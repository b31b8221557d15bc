use tracing::warn;

use super::{types::Config, ConfigError};
use crate::language::LanguageDetector;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0 and the webhook path is absolute and free
/// - Plex URL is http(s) and the token looks plausible
/// - OpenSubtitles credentials are present
/// - Path mappings have both sides set
/// - Switch timing is non-zero and the poll interval fits in the timeout
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }
    if !config.server.webhook_path.starts_with('/') {
        return Err(invalid("server.webhook_path must start with '/'"));
    }
    let webhook_path = config.server.webhook_path.trim_end_matches('/');
    if webhook_path.is_empty()
        || webhook_path == "/metrics"
        || webhook_path == "/api"
        || webhook_path.starts_with("/api/")
    {
        return Err(invalid("server.webhook_path collides with a built-in route"));
    }

    let url = config.plex.url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid("plex.url must start with http:// or https://"));
    }
    if config.plex.token.trim().len() < 10 {
        return Err(invalid("plex.token looks too short (expected at least 10 characters)"));
    }
    if config.plex.timeout_secs == 0 {
        return Err(invalid("plex.timeout_secs cannot be 0"));
    }

    let os = &config.opensubtitles;
    if os.api_key.trim().is_empty() {
        return Err(invalid("opensubtitles.api_key is required"));
    }
    if os.username.trim().is_empty() || os.password.is_empty() {
        return Err(invalid("opensubtitles.username and opensubtitles.password are required"));
    }
    if os.timeout_secs == 0 || os.download_timeout_secs == 0 {
        return Err(invalid("opensubtitles timeouts cannot be 0"));
    }

    for (i, mapping) in config.path_mappings.iter().enumerate() {
        if mapping.remote.is_empty() || mapping.local.is_empty() {
            return Err(invalid(&format!(
                "path_mappings[{i}] needs both remote and local"
            )));
        }
    }

    if config.switch.timeout_secs == 0 {
        return Err(invalid("switch.timeout_secs cannot be 0"));
    }
    if config.switch.poll_interval_ms == 0 {
        return Err(invalid("switch.poll_interval_ms cannot be 0"));
    }
    if config.switch.poll_interval_ms > config.switch.timeout_secs * 1000 {
        return Err(invalid("switch.poll_interval_ms cannot exceed switch.timeout_secs"));
    }

    let detector = LanguageDetector::new();
    for code in config.subtitles.languages.iter() {
        if !detector.supports(code) {
            warn!(
                language = code,
                "No detection profile for language; downloaded subtitles will fail verification"
            );
        }
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid() -> Config {
        load_config_from_str(
            r#"
[plex]
token = "abcdefghijklmnop"

[opensubtitles]
api_key = "key"
username = "user"
password = "pass"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_short_token_fails() {
        let mut config = valid();
        config.plex.token = "short".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("plex.token"));
    }

    #[test]
    fn test_validate_plex_url_scheme() {
        let mut config = valid();
        config.plex.url = "plex.lan:32400".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_webhook_path() {
        let mut config = valid();
        config.server.webhook_path = "plexsubs".to_string();
        assert!(validate_config(&config).is_err());

        for taken in ["/", "/metrics", "/api/v1/hook"] {
            config.server.webhook_path = taken.to_string();
            assert!(validate_config(&config).is_err(), "{taken} accepted");
        }
    }

    #[test]
    fn test_validate_empty_mapping_side() {
        let mut config = valid();
        config.path_mappings.push(crate::paths::PathMapping::new("/tv", ""));
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("path_mappings[1]"));
    }

    #[test]
    fn test_validate_switch_timing() {
        let mut config = valid();
        config.switch.poll_interval_ms = 30_000;
        assert!(validate_config(&config).is_err());

        let mut config = valid();
        config.switch.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
