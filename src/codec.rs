//! Encoding of session and flash state into cookie values and back.

use std::borrow::Cow;

use crate::{
    config::CookieSessionConfig,
    crypto::CookieCrypto,
    error::Result,
    expiration::{now_millis, process_expiration},
    format,
    state::{FlashState, KEY_EXPIRATION, KvState, SessionState},
};

const SIGNATURE_DELIMITER: char = '-';

/// How a cookie payload is protected on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Signed, optionally encrypted.
    Session,
    /// Plain pairs.
    Flash,
}

/// Turns session and flash state into cookie values and back.
///
/// Decoding never fails: anything that does not verify is treated as if no cookie was sent.
#[derive(Debug, Clone)]
pub struct SessionCodec<C: CookieCrypto> {
    crypto: C,
    session_will_expire: bool,
    ttl: i64,
    ping_path: Option<Cow<'static, str>>,
    encrypt: bool,
}

impl<C: CookieCrypto> SessionCodec<C> {
    pub fn new(crypto: C, config: &CookieSessionConfig) -> Self {
        Self {
            crypto,
            session_will_expire: config.session_will_expire(),
            ttl: config.ttl_millis(),
            ping_path: config.ping_path.clone(),
            encrypt: config.encrypt,
        }
    }

    /// Encode `session`, or return `None` when there is nothing worth sending back.
    pub fn encode_session(&self, session: &mut SessionState) -> Result<Option<String>> {
        self.encode_session_at(session, now_millis())
    }

    /// [`SessionCodec::encode_session`] with an explicit clock, in milliseconds.
    pub fn encode_session_at(
        &self,
        session: &mut SessionState,
        now: i64,
    ) -> Result<Option<String>> {
        if !session.changed() && (session.is_empty() || !self.session_will_expire) {
            return Ok(None);
        }

        session.id();
        if self.session_will_expire && !session.contains(KEY_EXPIRATION) {
            session.put(KEY_EXPIRATION, now.saturating_add(self.ttl).to_string());
        }

        let value = self.dissolve(session, Policy::Session)?;
        session.mark_unchanged();
        Ok(Some(value))
    }

    /// Encode the outgoing half of `flash`, or `None` when no message is scheduled.
    pub fn encode_flash(&self, flash: &FlashState) -> Result<Option<String>> {
        if flash.out().is_empty() {
            return Ok(None);
        }
        self.dissolve(flash.out(), Policy::Flash).map(Some)
    }

    /// Decode a session cookie value received on a request to `request_path`.
    pub fn decode_session(&self, encoded: &str, request_path: &str) -> SessionState {
        self.decode_session_at(encoded, request_path, now_millis())
    }

    /// [`SessionCodec::decode_session`] with an explicit clock, in milliseconds.
    pub fn decode_session_at(&self, encoded: &str, request_path: &str, now: i64) -> SessionState {
        let mut session = SessionState::new();
        let new_session = encoded.trim().is_empty();
        if !new_session {
            self.resolve(encoded, &mut session, Policy::Session);
        }

        process_expiration(
            session,
            now,
            new_session,
            self.session_will_expire,
            self.ttl,
            self.ping_path.as_deref(),
            request_path,
        )
    }

    /// Decode a flash cookie value. The result is never re-emitted unless the application
    /// writes to it or keeps it.
    pub fn decode_flash(&self, encoded: &str) -> FlashState {
        let mut flash = FlashState::new();
        if !encoded.trim().is_empty() {
            self.resolve(encoded, flash.current_mut(), Policy::Flash);
            flash.discard();
        }
        flash
    }

    fn dissolve(&self, kv: &KvState, policy: Policy) -> Result<String> {
        let mut data = format::dissolve(kv);
        if policy == Policy::Session {
            let signature = self.crypto.sign(&data);
            data = format!("{signature}{SIGNATURE_DELIMITER}{data}");
            if self.encrypt {
                data = self.crypto.encrypt(&data)?;
            }
        }
        Ok(format::encode_text(&data))
    }

    fn resolve(&self, encoded: &str, kv: &mut KvState, policy: Policy) {
        let data = match format::decode_text(encoded) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(err = %err, ?policy, "cookie text rejected");
                return;
            }
        };

        let payload = match policy {
            Policy::Session => match self.verified_payload(&data) {
                Some(payload) => payload,
                None => {
                    tracing::debug!("session cookie rejected");
                    return;
                }
            },
            Policy::Flash => data,
        };

        format::resolve(&payload, kv);
    }

    fn verified_payload(&self, data: &str) -> Option<String> {
        let data = if self.encrypt {
            self.crypto.decrypt(data).ok()?
        } else {
            data.to_owned()
        };

        let (signature, payload) = data.split_once(SIGNATURE_DELIMITER)?;
        self.crypto
            .verify(payload, signature)
            .then(|| payload.to_owned())
    }
}
