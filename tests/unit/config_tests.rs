use backend_lib::config::{Settings, StorageBackend};

fn valid() -> Settings {
    let mut settings = Settings::default();
    settings.auth.access_token_secret = "a".to_string();
    settings.auth.refresh_token_secret = "b".to_string();
    settings
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.server.body_limit_bytes, 16 * 1024);
    assert_eq!(settings.storage.backend, StorageBackend::FlatFile);
    assert!(settings.auth.secure_cookies);
    // Secrets have no usable default
    assert!(settings.validate().is_err());
}

#[test]
fn test_valid_settings() {
    let settings = valid();
    settings.validate().unwrap();
    assert_eq!(settings.bind_addr().unwrap().port(), 8000);
}

#[test]
fn test_invalid_combinations() {
    let mut same = valid();
    same.auth.refresh_token_secret = same.auth.access_token_secret.clone();
    assert!(same.validate().is_err());

    let mut short_refresh = valid();
    short_refresh.auth.refresh_token_ttl_secs = short_refresh.auth.access_token_ttl_secs;
    assert!(short_refresh.validate().is_err());

    let mut bad_host = valid();
    bad_host.server.host = "not a host".to_string();
    assert!(bad_host.validate().is_err());

    let mut bad_level = valid();
    bad_level.log.level = "loud".to_string();
    assert!(bad_level.validate().is_err());
}
