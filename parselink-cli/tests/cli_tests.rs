use clap::Parser;
use parselink_cli::{Args, Command, resolve_config, run};
use parselink_sync::transport::mock::MockTransport;
use parselink_sync::{HttpMethod, ParseConfig, SESSION_TOKEN_HEADER, Transport};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TOKEN: &str = "r:pnktnjyb996sj4p156gjtp4im";

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("parselink").chain(argv.iter().copied())).unwrap()
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn setup() -> (Arc<MockTransport>, Arc<dyn Transport>, Arc<ParseConfig>) {
    let mock = Arc::new(MockTransport::new());
    let transport: Arc<dyn Transport> = mock.clone();
    let config = Arc::new(ParseConfig::new("http://localhost:1337/parse", "myApp").unwrap());
    (mock, transport, config)
}

// ── Argument parsing ────────────────────────────────────────────

#[test]
fn parses_fetch_with_where() {
    let args = parse(&["-v", "fetch", "Post", "--where", r#"{"title":"a"}"#]);
    assert!(args.verbose);
    match args.command {
        Command::Fetch { class, filter } => {
            assert_eq!(class, "Post");
            assert_eq!(filter.as_deref(), Some(r#"{"title":"a"}"#));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn command_name_hides_credentials() {
    let args = parse(&["login", "cooldude6", "p_n7!-e8"]);
    assert_eq!(args.command.name(), "login");
}

// ── Configuration ───────────────────────────────────────────────

#[test]
fn flags_override_environment() {
    let args = parse(&["--server", "http://example.com/parse/", "--rest-key", "k", "me"]);
    let config = resolve_config(&args, |key| match key {
        "PARSE_SERVER_URL" => Some("http://ignored/parse".into()),
        "PARSE_APP_ID" => Some("envApp".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.server_url(), "http://example.com/parse");
    assert_eq!(config.app_id(), "envApp");
    assert_eq!(config.rest_api_key(), Some("k"));
}

#[test]
fn defaults_apply_without_flags_or_environment() {
    let config = resolve_config(&parse(&["me"]), no_env).unwrap();
    assert_eq!(config.server_url(), "http://localhost:1337/parse");
    assert_eq!(config.app_id(), "myApp");
    assert_eq!(config.rest_api_key(), None);
}

#[test]
fn reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parselink.json");
    std::fs::write(
        &path,
        r#"{"server_url": "http://files/parse", "app_id": "fileApp", "timeout_secs": 5}"#,
    )
    .unwrap();

    let args = parse(&["--config", path.to_str().unwrap(), "me"]);
    let config = resolve_config(&args, no_env).unwrap();

    assert_eq!(config.server_url(), "http://files/parse");
    assert_eq!(config.app_id(), "fileApp");
    assert_eq!(config.timeout(), Duration::from_secs(5));
}

#[test]
fn invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parselink.json");
    std::fs::write(&path, r#"{"server_url": "", "app_id": "fileApp"}"#).unwrap();

    let args = parse(&["--config", path.to_str().unwrap(), "me"]);
    let err = resolve_config(&args, no_env).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

// ── Commands ────────────────────────────────────────────────────

#[tokio::test]
async fn login_prints_session_without_password() {
    let (mock, transport, config) = setup();
    mock.push_response(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));

    let output = run(&parse(&["login", "cooldude6", "p_n7!-e8"]), config, transport)
        .await
        .unwrap();

    assert_eq!(
        output,
        json!({"username": "cooldude6", "objectId": "g7y9tkhB7O", "sessionToken": TOKEN})
    );
    assert_eq!(mock.last_request().unwrap().method, HttpMethod::Get);
}

#[tokio::test]
async fn me_without_token_fails_before_sending() {
    let (mock, transport, config) = setup();

    let err = run(&parse(&["me"]), config, transport).await.unwrap_err();

    assert!(err.to_string().contains("session"));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn logout_sends_token_header() {
    let (mock, transport, config) = setup();

    let output = run(&parse(&["--session-token", TOKEN, "logout"]), config, transport)
        .await
        .unwrap();

    assert_eq!(output, json!({"loggedOut": true}));
    let req = mock.last_request().unwrap();
    assert_eq!(req.header_value(SESSION_TOKEN_HEADER), Some(TOKEN));
}

#[tokio::test]
async fn fetch_prints_rows() {
    let (mock, transport, config) = setup();
    mock.push_response(json!({"results": [{"objectId": "a", "title": "one"}]}));

    let output = run(&parse(&["fetch", "Post"]), config, transport).await.unwrap();

    assert_eq!(output, json!([{"objectId": "a", "title": "one"}]));
}

#[tokio::test]
async fn create_rejects_non_object_data() {
    let (mock, transport, config) = setup();

    let result = run(&parse(&["create", "Post", "[1, 2]"]), config, transport).await;

    assert!(result.is_err());
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn dry_run_describes_without_sending() {
    let (mock, transport, config) = setup();

    let output = run(
        &parse(&["--dry-run", "login", "cooldude6", "p_n7!-e8"]),
        config,
        transport,
    )
    .await
    .unwrap();

    assert_eq!(mock.request_count(), 0);
    assert_eq!(
        output,
        json!({
            "method": "GET",
            "url": "http://localhost:1337/parse/login",
            "headers": ["X-Parse-Application-Id"],
            "contentType": "application/x-www-form-urlencoded",
            "body": ["username", "password"],
        })
    );
}
