//! Tests for API client configuration

use super::*;

#[test]
fn test_api_client_config_from_panel_config() {
    let api = ApiConfig {
        base_url: "https://cms.example.com/api".to_string(),
        timeout_seconds: 5,
        user_agent: "panel-test/1.0".to_string(),
    };

    let config = ApiClientConfig::from(&api);
    assert_eq!(config.base_url, "https://cms.example.com/api");
    assert_eq!(config.timeout_seconds, 5);
    assert_eq!(config.user_agent, "panel-test/1.0");
    assert!(config.headers.is_empty());
}

#[test]
fn test_base_url_gets_trailing_slash() {
    let config = ApiClientConfig::new("https://cms.example.com/api");
    let base = config.normalized_base_url().unwrap();
    assert_eq!(base.as_str(), "https://cms.example.com/api/");
    assert_eq!(
        base.join(endpoints::LOGIN).unwrap().as_str(),
        "https://cms.example.com/api/auth/login"
    );
}

#[test]
fn test_invalid_base_url_is_config_error() {
    let config = ApiClientConfig::new("not a url");
    assert!(matches!(
        config.normalized_base_url(),
        Err(PanelError::Config { .. })
    ));
}

#[test]
fn test_invalid_header_is_rejected() {
    let config = ApiClientConfig::new("https://cms.example.com/api/")
        .with_header("bad header".to_string(), "value".to_string())
        .with_timeout(3);
    assert_eq!(config.timeout_seconds, 3);
    assert!(create_http_client(&config).is_err());
}
