// Tests for the expiration policy as seen through the layer: expired sessions, sliding
// expiration, the keep-alive ping path, and how the TTL maps to cookie Max-Age.
mod common;

use axum::{Router, body::Body, routing::get};
use http::{Request, header};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt as _;
use tower_cookies::Cookie;

use cookie_session_codec::{
    CookieSessionConfig, CookieSessionManagerLayer, Key, KeyCrypto, KvState, Session,
    SessionCodec, SessionState, format, state::KEY_EXPIRATION,
};

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn routes() -> Router {
    Router::new()
        .route(
            "/get-user",
            get(|session: Session| async move {
                session.get("user").unwrap_or_else(|| "none".to_string())
            }),
        )
        .route(
            "/expired",
            get(|session: Session| async move { format!("{}", session.is_expired()) }),
        )
        .route("/ping", get(|| async { "pong" }))
}

fn config() -> CookieSessionConfig {
    CookieSessionConfig::default()
        .with_ttl(Duration::hours(1))
        .with_ping_path("/ping")
}

fn app(key: &Key, config: CookieSessionConfig) -> Router {
    routes().layer(CookieSessionManagerLayer::new(key.clone()).with_config(config))
}

fn issue_cookie(key: &Key, config: &CookieSessionConfig, issued_at: i64) -> Cookie<'static> {
    // Mint a session cookie as if it had been issued at `issued_at`.
    let codec = SessionCodec::new(KeyCrypto::new(key), config);
    let mut session = SessionState::new();
    session.put("user", "alice");
    let value = codec
        .encode_session_at(&mut session, issued_at)
        .expect("session encodes")
        .expect("changed session produces a cookie");
    Cookie::new("session", value)
}

fn stored_expiration(cookie: &Cookie<'_>) -> i64 {
    // Read the expiration timestamp out of a signed, unencrypted session cookie.
    let text = format::decode_text(cookie.value()).expect("cookie is url-safe text");
    let (_signature, payload) = text.split_once('-').expect("cookie carries a signature");
    let mut kv = KvState::new();
    format::resolve(payload, &mut kv);
    kv.get(KEY_EXPIRATION)
        .expect("cookie carries an expiration")
        .parse()
        .expect("expiration is numeric")
}

async fn send(app: &Router, uri: &str, cookie: &Cookie<'_>) -> http::Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .header(header::COOKIE, common::cookie_header_value(cookie))
        .body(Body::empty())
        .expect("request builds successfully");
    app.clone()
        .oneshot(req)
        .await
        .expect("service call succeeds")
}

#[tokio::test]
async fn live_session_is_restored() {
    // Exercise: a cookie issued ten minutes ago with a one hour TTL.
    // Expectation: the stored value is visible and the session is not flagged as expired.
    let key = Key::generate();
    let cookie = issue_cookie(&key, &config(), now_millis() - 10 * 60 * 1000);
    let app = app(&key, config());

    let res = send(&app, "/get-user", &cookie).await;
    assert_eq!(common::body_string(res.into_body()).await, "alice");

    let res = send(&app, "/expired", &cookie).await;
    assert_eq!(common::body_string(res.into_body()).await, "false");
}

#[tokio::test]
async fn stale_session_is_replaced() {
    // Exercise: a cookie issued two hours ago with a one hour TTL.
    // Expectation: the content is gone, the expired indicator is set, and a fresh cookie is
    // issued.
    let key = Key::generate();
    let cookie = issue_cookie(&key, &config(), now_millis() - 2 * 60 * 60 * 1000);
    let app = app(&key, config());

    let res = send(&app, "/get-user", &cookie).await;
    let replacement = common::get_session_cookie(&res);
    assert_ne!(replacement.value(), cookie.value());
    assert_eq!(common::body_string(res.into_body()).await, "none");

    let res = send(&app, "/expired", &cookie).await;
    assert_eq!(common::body_string(res.into_body()).await, "true");
}

#[tokio::test]
async fn ordinary_request_slides_expiration() {
    // Exercise: send a live cookie to an ordinary path.
    // Expectation: the reissued cookie expires later than the original.
    let key = Key::generate();
    let cookie = issue_cookie(&key, &config(), now_millis() - 10 * 60 * 1000);
    let app = app(&key, config());

    let res = send(&app, "/get-user", &cookie).await;
    let refreshed = common::get_session_cookie(&res);

    assert!(stored_expiration(&refreshed) > stored_expiration(&cookie));
}

#[tokio::test]
async fn ping_path_keeps_expiration() {
    // Exercise: send the same live cookie to the keep-alive path.
    // Expectation: the expiration timestamp is carried over unchanged.
    let key = Key::generate();
    let cookie = issue_cookie(&key, &config(), now_millis() - 10 * 60 * 1000);
    let app = app(&key, config());

    let res = send(&app, "/ping", &cookie).await;
    let pinged = common::get_session_cookie(&res);

    assert_eq!(stored_expiration(&pinged), stored_expiration(&cookie));
}

#[tokio::test]
async fn session_cookie_without_max_age_by_default() {
    // Exercise: default (non-persistent) configuration.
    // Expectation: the session cookie lives until the browser closes.
    let key = Key::generate();
    let cookie = issue_cookie(&key, &config(), now_millis());
    let app = app(&key, config());

    let res = send(&app, "/get-user", &cookie).await;
    assert!(common::get_session_cookie(&res).max_age().is_none());
}

#[tokio::test]
async fn persistent_cookie_max_age_matches_ttl() {
    // Exercise: persistent configuration with a one hour TTL.
    // Expectation: cookie Max-Age equals the TTL.
    let key = Key::generate();
    let config = config().with_persistent(true);
    let cookie = issue_cookie(&key, &config, now_millis());
    let app = app(&key, config);

    let res = send(&app, "/get-user", &cookie).await;
    assert_eq!(
        common::get_session_cookie(&res).max_age(),
        Some(Duration::hours(1))
    );
}
