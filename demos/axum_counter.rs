use std::net::SocketAddr;

use axum::{Router, routing::get};
use cookie_session_codec::{
    CookieSessionConfig, CookieSessionManagerLayer, Flash, Key, SameSite, Session,
};
use time::Duration;

async fn index(session: Session, flash: Flash) -> String {
    let n: usize = session
        .get_value("n")
        .expect("session get_value succeeds")
        .unwrap_or(0);
    session
        .insert_value("n", &(n + 1))
        .expect("session insert_value succeeds");
    if n > 0 && n % 10 == 0 {
        flash.success(format!("{n} visits!"));
    }
    let notice = flash.success_message().unwrap_or_default();
    format!("n={n} {notice}")
}

#[tokio::main]
async fn main() {
    let key = Key::generate();
    let session_config = CookieSessionConfig::default()
        // Default: "session"
        .with_session_name("session")
        // Default: "flash"
        .with_flash_name("flash")
        // Default: 30 minutes
        .with_ttl(Duration::hours(1))
        // Default: None
        .with_ping_path("/ping")
        // Default: false
        .with_encrypt(true)
        // Default: false
        .with_persistent(false)
        // Default: true
        .with_http_only(true)
        // Default: SameSite::Strict
        .with_same_site(SameSite::Strict)
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: "/"
        .with_path("/")
        // Default: None
        .without_domain()
        // Default: 4096
        .with_max_cookie_bytes(4096);
    let session_layer = CookieSessionManagerLayer::new(key).with_config(session_config);

    let app = Router::new()
        .route("/", get(index))
        .route("/ping", get(|| async { "pong" }))
        .layer(session_layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
