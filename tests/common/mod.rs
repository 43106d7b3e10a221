#![allow(dead_code)]

// Shared helpers for integration tests.
//
// These helpers use `tower_cookies::Cookie` parsing/encoding to match what the middleware emits in
// `Set-Cookie` and what browsers send back in `Cookie`.
use std::convert::Infallible;

use axum::body::Body;
use http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt as _;
use tower_cookies::Cookie;

use cookie_session_codec::{CookieSessionConfig, CookieSessionManagerLayer, Key, Session};

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub async fn handler(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Basic handler used by many tests: write a single key into the session.
    let session = req
        .extensions()
        .get::<Session>()
        .cloned()
        .expect("request includes Session extension");

    session.insert("foo", "42");

    Ok(Response::new(Body::empty()))
}

pub async fn noop_handler(_: Request<Body>) -> Result<Response<Body>, Infallible> {
    // Handler that does not access the session at all.
    Ok(Response::new(Body::empty()))
}

pub fn make_layer(config: CookieSessionConfig) -> (Key, CookieSessionManagerLayer) {
    // Return both the key and the layer for tests that need to build a second layer sharing the
    // same key.
    let key = Key::generate();
    let layer = CookieSessionManagerLayer::new(key.clone()).with_config(config);
    (key, layer)
}

pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
    // Parse every `Set-Cookie` header and return the one with the given name.
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value.to_str().expect("set-cookie header is valid utf-8");
            Cookie::parse_encoded(value)
                .expect("set-cookie parses successfully")
                .into_owned()
        })
        .find(|cookie| cookie.name() == name)
}

pub fn get_cookie(headers: &HeaderMap, name: &str) -> Cookie<'static> {
    find_cookie(headers, name).expect("response sets the named cookie")
}

pub fn get_session_cookie(res: &Response<Body>) -> Cookie<'static> {
    get_cookie(res.headers(), cookie_session_codec::DEFAULT_SESSION_COOKIE_NAME)
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Encode a cookie for use in a `Cookie` request header.
    cookie.encoded().to_string()
}

pub fn cookie_header(cookies: &[&Cookie<'_>]) -> String {
    // Join several cookies into a single `Cookie` request header.
    cookies
        .iter()
        .map(|cookie| cookie_header_value(cookie))
        .collect::<Vec<_>>()
        .join("; ")
}
