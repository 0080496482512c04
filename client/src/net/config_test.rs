use std::sync::{Mutex, MutexGuard, PoisonError};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers must hold `env_lock()` so env mutations do not race.
unsafe fn clear_api_env() {
    unsafe {
        std::env::remove_var("STOREFRONT_API_BASE_URL");
        std::env::remove_var("STOREFRONT_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("STOREFRONT_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = env_lock();
    unsafe { clear_api_env() };

    let cfg = ApiConfig::from_env();
    assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(
        cfg.timeouts,
        ApiTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg, ApiConfig::default());
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_lock();
    unsafe {
        clear_api_env();
        std::env::set_var("STOREFRONT_API_BASE_URL", "https://shop.example.test/api/");
        std::env::set_var("STOREFRONT_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("STOREFRONT_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = ApiConfig::from_env();
    assert_eq!(cfg.base_url, "https://shop.example.test/api");
    assert_eq!(cfg.timeouts, ApiTimeouts { request_secs: 42, connect_secs: 7 });

    unsafe { clear_api_env() };
}

#[test]
fn from_env_bad_timeout_falls_back_to_default() {
    let _guard = env_lock();
    unsafe {
        clear_api_env();
        std::env::set_var("STOREFRONT_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = ApiConfig::from_env();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_api_env() };
}

#[test]
fn new_trims_trailing_slashes() {
    assert_eq!(ApiConfig::new("http://127.0.0.1:9000//").base_url, "http://127.0.0.1:9000");
    assert_eq!(normalize_base_url("  http://h/api "), "http://h/api");
}
