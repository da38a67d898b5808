use super::*;

/// # Safety
/// Tests touching the environment share one lock to avoid races.
unsafe fn clear_env() {
    unsafe {
        std::env::remove_var("FORMBASE_API_URL");
        std::env::remove_var("FORMBASE_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("FORMBASE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("FORMBASE_TOKEN_KEY");
        std::env::remove_var("FORMBASE_MERGE_PROFILE");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe { clear_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.request_timeout_secs, 10);
    assert!(cfg.merge_profile);
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_env();
        std::env::set_var("FORMBASE_API_URL", "https://api.example.test/");
        std::env::set_var("FORMBASE_REQUEST_TIMEOUT_SECS", "30");
        std::env::set_var("FORMBASE_CONNECT_TIMEOUT_SECS", "2");
        std::env::set_var("FORMBASE_TOKEN_KEY", "custom_key");
        std::env::set_var("FORMBASE_MERGE_PROFILE", "false");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.base_url, "https://api.example.test");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.connect_timeout_secs, 2);
    assert_eq!(cfg.token_key, "custom_key");
    assert!(!cfg.merge_profile);

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_garbage_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_env();
        std::env::set_var("FORMBASE_REQUEST_TIMEOUT_SECS", "soon");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "FORMBASE_REQUEST_TIMEOUT_SECS", .. }));

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_zero_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_env();
        std::env::set_var("FORMBASE_REQUEST_TIMEOUT_SECS", "0");
    }

    assert!(ClientConfig::from_env().is_err());

    unsafe { clear_env() };
}

#[test]
fn parse_bool_accepts_common_spellings() {
    assert!(parse_bool("X", None).unwrap());
    assert!(parse_bool("X", Some("yes")).unwrap());
    assert!(!parse_bool("X", Some(" 0 ")).unwrap());
    assert!(parse_bool("X", Some("maybe")).is_err());
}

#[test]
fn with_base_url_strips_trailing_slash() {
    let cfg = ClientConfig::with_base_url("http://localhost:9000//");
    assert_eq!(cfg.base_url, "http://localhost:9000");
    assert_eq!(cfg.token_key, DEFAULT_TOKEN_KEY);
}
