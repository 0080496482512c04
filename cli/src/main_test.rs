use super::*;
use serde_json::json;

fn temp_state_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("storefront-cli-{}", uuid::Uuid::new_v4()))
        .join("session.json")
}

fn cli_for(state_file: &std::path::Path, args: &[&str]) -> Cli {
    let mut argv = vec![
        "storefront",
        "--base-url",
        "http://127.0.0.1:9/api/",
        "--state-file",
        state_file.to_str().unwrap(),
    ];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn parse_method_accepts_any_case() {
    assert_eq!(parse_method("get").unwrap(), reqwest::Method::GET);
    assert_eq!(parse_method(" Post ").unwrap(), reqwest::Method::POST);
}

#[test]
fn parse_method_rejects_invalid_token() {
    assert!(matches!(parse_method("GE T"), Err(CliError::InvalidMethod(_))));
}

#[test]
fn parse_json_arg_handles_absent_and_invalid() {
    assert_eq!(parse_json_arg(None).unwrap(), None);
    assert_eq!(parse_json_arg(Some(r#"{"qty":2}"#)).unwrap(), Some(json!({ "qty": 2 })));
    assert!(matches!(parse_json_arg(Some("{")), Err(CliError::InvalidJson(_))));
}

#[test]
fn login_requires_email_and_password() {
    let path = temp_state_file();
    let parsed = Cli::try_parse_from([
        "storefront",
        "--state-file",
        path.to_str().unwrap(),
        "login",
        "--email",
        "a@b.com",
        "--password",
        "x",
    ])
    .unwrap();
    assert!(matches!(parsed.command, Command::Login { ref email, ref password } if email == "a@b.com" && password == "x"));
}

#[test]
fn api_config_uses_cli_overrides() {
    let path = temp_state_file();
    let cli = cli_for(&path, &["--request-timeout-secs", "5", "whoami"]);
    let config = api_config(&cli);
    assert_eq!(config.base_url, "http://127.0.0.1:9/api");
    assert_eq!(config.timeouts.request_secs, 5);
    assert_eq!(config.timeouts.connect_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
}

#[test]
fn state_file_survives_restart() {
    let path = temp_state_file();

    let cli = cli_for(&path, &["point", "set", r#"{"id":3}"#]);
    let (mut store, _) = build_store(&cli).unwrap();
    let Command::Point(point) = cli.command else { panic!("expected point command") };
    run_point(&mut store, point).unwrap();

    let cli = cli_for(&path, &["whoami"]);
    let (store, _) = build_store(&cli).unwrap();
    assert_eq!(store.selected_point(), Some(&json!({ "id": 3 })));
    assert!(!store.is_logged_in());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[tokio::test]
async fn logout_against_unreachable_server_clears_state_file() {
    let path = temp_state_file();
    let storage = FileStorage::new(&path);
    storage.set("auth_token", "T").unwrap();
    storage.set("userName", "A").unwrap();
    storage.set("userEmail", "a@b.com").unwrap();
    storage.set("userRole", "1").unwrap();

    let cli = cli_for(&path, &["--connect-timeout-secs", "1", "logout"]);
    let (mut store, _) = build_store(&cli).unwrap();
    assert!(store.is_admin());

    store.logout().await;

    assert!(!store.is_logged_in());
    assert_eq!(storage.get("auth_token"), None);
    assert_eq!(storage.get("userRole"), None);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
