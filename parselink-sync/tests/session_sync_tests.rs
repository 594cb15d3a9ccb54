use parselink_model::{EntityEvent, SessionEntity};
use parselink_sync::transport::mock::MockTransport;
use parselink_sync::{
    APPLICATION_ID_HEADER, ContentType, HttpMethod, ParseConfig, SESSION_TOKEN_HEADER, SessionSync,
    SyncError, SyncOptions, Transport,
};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::Receiver;

const SERVER: &str = "http://localhost:1337/parse";
const TOKEN: &str = "r:pnktnjyb996sj4p156gjtp4im";

fn setup() -> (Arc<MockTransport>, SessionSync) {
    let mock = Arc::new(MockTransport::new());
    let transport: Arc<dyn Transport> = mock.clone();
    let config = Arc::new(ParseConfig::new(SERVER, "myApp").unwrap());
    (mock, SessionSync::new(config, transport))
}

fn user(attrs: Value) -> SessionEntity {
    match attrs {
        Value::Object(map) => SessionEntity::with_attributes(map),
        _ => SessionEntity::with_attributes(Map::new()),
    }
}

/// Drains the receiver, dropping attribute change notifications.
fn lifecycle_events(rx: &mut Receiver<EntityEvent>) -> Vec<EntityEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if !matches!(event, EntityEvent::Change { .. }) {
            events.push(event);
        }
    }
    events
}

// ── Signup ──────────────────────────────────────────────────────

#[tokio::test]
async fn signup_posts_to_users() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": 123, "createdAt": "2024-01-01T00:00:00.000Z"}));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));

    sync.signup(&user, SyncOptions::new()).unwrap().await.unwrap();

    assert_eq!(mock.request_count(), 1);
    let req = mock.last_request().unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, format!("{SERVER}/users"));
    assert_eq!(req.header_value(APPLICATION_ID_HEADER), Some("myApp"));
    assert_eq!(
        req.json_body(),
        Some(&json!({"username": "cooldude6", "password": "p_n7!-e8"}))
    );
    assert_eq!(user.id().as_deref(), Some("123"));
    assert!(!user.has("createdAt"));
}

#[tokio::test]
async fn second_signup_is_rejected_without_a_request() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": 123}));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));

    sync.signup(&user, SyncOptions::new()).unwrap().await.unwrap();
    let err = sync.signup(&user, SyncOptions::new()).err().unwrap();

    assert!(matches!(err, SyncError::AlreadyExists));
    assert!(err.to_string().contains("existing"));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn signup_emits_event_with_token() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));
    let mut rx = user.subscribe();

    sync.signup(&user, SyncOptions::new()).unwrap().await.unwrap();

    assert_eq!(
        lifecycle_events(&mut rx),
        vec![EntityEvent::Signup {
            session_token: Some(TOKEN.to_string())
        }]
    );
}

// ── Login ───────────────────────────────────────────────────────

#[test]
fn login_checks_username_before_password() {
    let (mock, sync) = setup();

    let err = sync.login(&user(json!({})), SyncOptions::new()).err().unwrap();
    assert!(err.to_string().contains("username"));

    let err = sync
        .login(&user(json!({"password": "p_n7!-e8"})), SyncOptions::new())
        .err()
        .unwrap();
    assert!(err.to_string().contains("username"));

    let err = sync
        .login(&user(json!({"username": "cooldude6"})), SyncOptions::new())
        .err()
        .unwrap();
    assert!(err.to_string().contains("password"));

    assert_eq!(mock.request_count(), 0);
}

#[test]
fn login_treats_empty_credentials_as_missing() {
    let (_, sync) = setup();
    let err = sync
        .login(
            &user(json!({"username": "", "password": "p_n7!-e8"})),
            SyncOptions::new(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::MissingCredential("username")));
}

#[tokio::test]
async fn login_sends_form_encoded_get() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));

    sync.login(&user, SyncOptions::new()).unwrap().await.unwrap();

    assert_eq!(mock.request_count(), 1);
    let req = mock.last_request().unwrap();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, format!("{SERVER}/login"));
    assert_eq!(req.content_type, ContentType::FormUrlEncoded);
    assert!(req.process_data);
    assert_eq!(req.form_value("username"), Some("cooldude6"));
    assert_eq!(req.form_value("password"), Some("p_n7!-e8"));
    assert_eq!(req.header_value(SESSION_TOKEN_HEADER), None);
}

#[tokio::test]
async fn login_stores_id_and_token_and_emits_once() {
    let (mock, sync) = setup();
    mock.push_response(json!({
        "objectId": "g7y9tkhB7O",
        "sessionToken": TOKEN,
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-01T00:00:00.000Z",
    }));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));
    let mut rx = user.subscribe();

    let parsed = sync.login(&user, SyncOptions::new()).unwrap().await.unwrap();

    assert_eq!(parsed, json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));
    assert_eq!(user.id().as_deref(), Some("g7y9tkhB7O"));
    assert_eq!(user.session_token().as_deref(), Some(TOKEN));
    assert_eq!(
        lifecycle_events(&mut rx),
        vec![EntityEvent::Login {
            session_token: Some(TOKEN.to_string())
        }]
    );
}

// ── Authenticated verbs ─────────────────────────────────────────

#[test]
fn authenticated_verbs_require_a_session() {
    let (mock, sync) = setup();
    let user = user(json!({"objectId": "g7y9tkhB7O", "username": "cooldude6"}));

    for result in [
        sync.update(&user, SyncOptions::new()),
        sync.retrieve(&user, SyncOptions::new()),
        sync.logout(&user, SyncOptions::new()),
    ] {
        let err = result.err().unwrap();
        assert!(matches!(err, SyncError::MissingSession));
        assert!(err.to_string().contains("session"));
    }
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn update_puts_profile_with_token_in_header_only() {
    let (mock, sync) = setup();
    mock.push_response(json!({"updatedAt": "2024-01-03T00:00:00.000Z"}));
    let user = user(json!({
        "objectId": "g7y9tkhB7O",
        "username": "cooldude6",
        "password": "p_n7!-e8",
        "sessionToken": TOKEN,
        "phone": "415-392-0202",
    }));
    let mut rx = user.subscribe();

    sync.update(&user, SyncOptions::new()).unwrap().await.unwrap();

    let req = mock.last_request().unwrap();
    assert_eq!(req.method, HttpMethod::Put);
    assert_eq!(req.url, format!("{SERVER}/users/g7y9tkhB7O"));
    assert_eq!(req.header_value(SESSION_TOKEN_HEADER), Some(TOKEN));
    assert_eq!(
        req.json_body(),
        Some(&json!({
            "objectId": "g7y9tkhB7O",
            "username": "cooldude6",
            "phone": "415-392-0202",
        }))
    );
    assert_eq!(lifecycle_events(&mut rx), vec![EntityEvent::Update]);
}

#[tokio::test]
async fn retrieve_gets_current_user() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": "g7y9tkhB7O", "phone": "415-392-0202"}));
    let user = user(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));
    let mut rx = user.subscribe();

    sync.retrieve(&user, SyncOptions::new()).unwrap().await.unwrap();

    let req = mock.last_request().unwrap();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, format!("{SERVER}/users/me"));
    assert_eq!(req.header_value(SESSION_TOKEN_HEADER), Some(TOKEN));
    assert_eq!(req.body, None);
    assert_eq!(user.get_str("phone").as_deref(), Some("415-392-0202"));
    assert_eq!(lifecycle_events(&mut rx), vec![EntityEvent::Retrieve]);
}

#[tokio::test]
async fn logout_clears_every_attribute() {
    let (mock, sync) = setup();
    let user = user(json!({
        "objectId": "g7y9tkhB7O",
        "username": "cooldude6",
        "sessionToken": TOKEN,
    }));
    let mut rx = user.subscribe();

    sync.logout(&user, SyncOptions::new()).unwrap().await.unwrap();

    let req = mock.last_request().unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, format!("{SERVER}/logout"));
    assert_eq!(req.header_value(SESSION_TOKEN_HEADER), Some(TOKEN));
    assert!(user.attributes().is_empty());
    assert!(user.is_new());
    assert!(!user.has_session());
    assert_eq!(lifecycle_events(&mut rx), vec![EntityEvent::Logout]);
}

// ── Callbacks and failures ──────────────────────────────────────

#[tokio::test]
async fn success_callback_runs_before_event() {
    let (mock, sync) = setup();
    mock.push_response(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));
    let user = user(json!({"username": "cooldude6", "password": "p_n7!-e8"}));
    let mut rx = user.subscribe();

    let seen = Arc::new(Mutex::new(None));
    let seen_in_callback = Arc::clone(&seen);
    let options = SyncOptions::new().on_success(move |entity, response, _| {
        // The event has not been sent yet, but the response is applied.
        *seen_in_callback.lock().unwrap() = Some((entity.id(), response.clone()));
    });

    sync.login(&user, options).unwrap().await.unwrap();

    let (id, response) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(id.as_deref(), Some("g7y9tkhB7O"));
    assert_eq!(response["sessionToken"], TOKEN);
    assert_eq!(lifecycle_events(&mut rx).len(), 1);
}

#[tokio::test]
async fn failure_runs_error_callback_and_emits_error() {
    let (mock, sync) = setup();
    mock.push_error(SyncError::Remote {
        status: 404,
        code: Some(101),
        message: "Invalid username/password.".into(),
    });
    let user = user(json!({"username": "cooldude6", "password": "wrong"}));
    let mut rx = user.subscribe();

    let failed = Arc::new(Mutex::new(false));
    let failed_in_callback = Arc::clone(&failed);
    let options = SyncOptions::new()
        .on_success(|_, _, _| panic!("success callback on failure"))
        .on_error(move |_, err, _| {
            assert!(matches!(err, SyncError::Remote { code: Some(101), .. }));
            *failed_in_callback.lock().unwrap() = true;
        });

    let result = sync.login(&user, options).unwrap().await;

    assert!(result.is_err());
    assert!(*failed.lock().unwrap());
    assert!(!user.has_session());
    let events = lifecycle_events(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], EntityEvent::Error { message } if message.contains("Invalid")));
}

#[tokio::test]
async fn failed_logout_keeps_the_session() {
    let (mock, sync) = setup();
    mock.push_error(SyncError::Network("connection refused".into()));
    let user = user(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));

    let result = sync.logout(&user, SyncOptions::new()).unwrap().await;

    assert!(result.is_err());
    assert_eq!(user.session_token().as_deref(), Some(TOKEN));
}

// ── Concurrent calls ────────────────────────────────────────────

#[tokio::test]
async fn concurrent_retrieves_leave_the_last_applied_response() {
    let (mock, sync) = setup();
    mock.push_response(json!({"phone": "415-000-0001"}));
    mock.push_response(json!({"phone": "415-000-0002"}));
    let user = user(json!({"objectId": "g7y9tkhB7O", "sessionToken": TOKEN}));

    let first = sync.retrieve(&user, SyncOptions::new()).unwrap();
    let second = sync.retrieve(&user, SyncOptions::new()).unwrap();

    // Requests go out when awaited, so the second call takes the first
    // queued response and the first call applies last.
    let applied_first = second.await.unwrap();
    let applied_last = first.await.unwrap();

    assert_eq!(applied_first, json!({"phone": "415-000-0001"}));
    assert_eq!(applied_last, json!({"phone": "415-000-0002"}));
    assert_eq!(user.get_str("phone").as_deref(), Some("415-000-0002"));
    assert_eq!(mock.request_count(), 2);
}
