//! Expiration policy applied to every decoded session.

use time::OffsetDateTime;

use crate::state::{KEY_EXPIRATION, KEY_EXPIRE_INDICATOR, SessionState};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Reconcile the expiration timestamp of a freshly decoded session.
///
/// `now` and `ttl` are in milliseconds. `new_session` is true when no cookie was sent. A
/// request whose path equals `ping_path` keeps the stored timestamp instead of sliding it.
///
/// Returns the session to hand to the application: the input itself, or a fresh state when the
/// input carried no readable timestamp or had expired. The fresh state is not examined again.
pub fn process_expiration(
    mut session: SessionState,
    now: i64,
    new_session: bool,
    session_will_expire: bool,
    ttl: i64,
    ping_path: Option<&str>,
    request_path: &str,
) -> SessionState {
    if !session_will_expire {
        return session;
    }

    let expiration = now.saturating_add(ttl);
    if new_session {
        session.load(KEY_EXPIRATION, expiration.to_string());
        return session;
    }

    let mut new_timestamp = expiration;
    match session.expires_at().filter(|ts| *ts >= 0) {
        None => {
            session = SessionState::new();
        }
        Some(old_timestamp) if old_timestamp < now => {
            session = SessionState::new();
            session.put(KEY_EXPIRE_INDICATOR, "true");
        }
        Some(old_timestamp) => {
            session.remove(KEY_EXPIRE_INDICATOR);
            if ping_path == Some(request_path) {
                new_timestamp = old_timestamp;
            }
        }
    }
    session.put(KEY_EXPIRATION, new_timestamp.to_string());
    session
}
