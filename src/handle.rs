//! Request-scoped handles to the decoded session and flash, shared between the layer and
//! handlers through request extensions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    codec::SessionCodec,
    crypto::CookieCrypto,
    error::{Error, Result},
    state::{FlashState, SessionState},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The session of the current request.
///
/// Cloning is cheap; every clone sees the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.state).get(key).map(str::to_owned)
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        lock(&self.state).put(key, value);
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        lock(&self.state).remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.state).contains(key)
    }

    pub fn clear(&self) {
        lock(&self.state).clear();
    }

    pub fn id(&self) -> String {
        lock(&self.state).id().to_owned()
    }

    pub fn is_expired(&self) -> bool {
        lock(&self.state).is_expired()
    }

    pub fn username(&self) -> Option<String> {
        lock(&self.state).username().map(str::to_owned)
    }

    pub fn set_username<V: Into<String>>(&self, username: V) {
        lock(&self.state).set_username(username);
    }

    /// Read a value stored with [`Session::insert_value`].
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| Error::Decode(err.to_string()))
    }

    /// Store `value` as JSON text.
    pub fn insert_value<K: Into<String>, T: Serialize>(&self, key: K, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|err| Error::Encode(err.to_string()))?;
        self.insert(key, raw);
        Ok(())
    }

    /// Run `f` with direct access to the underlying state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub(crate) fn encode<C: CookieCrypto>(&self, codec: &SessionCodec<C>) -> Result<Option<String>> {
        codec.encode_session(&mut lock(&self.state))
    }

    pub(crate) fn is_empty(&self) -> bool {
        lock(&self.state).is_empty()
    }
}

/// The flash messages of the current request.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    state: Arc<Mutex<FlashState>>,
}

impl Flash {
    pub fn new(state: FlashState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.state).get(key).map(str::to_owned)
    }

    pub fn put<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        lock(&self.state).put(key, value);
    }

    pub fn now<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        lock(&self.state).now(key, value);
    }

    pub fn error<V: Into<String>>(&self, message: V) {
        lock(&self.state).error(message);
    }

    pub fn error_message(&self) -> Option<String> {
        lock(&self.state).error_message().map(str::to_owned)
    }

    pub fn success<V: Into<String>>(&self, message: V) {
        lock(&self.state).success(message);
    }

    pub fn success_message(&self) -> Option<String> {
        lock(&self.state).success_message().map(str::to_owned)
    }

    pub fn keep(&self) {
        lock(&self.state).keep();
    }

    pub fn discard(&self) {
        lock(&self.state).discard();
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FlashState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub(crate) fn encode<C: CookieCrypto>(&self, codec: &SessionCodec<C>) -> Result<Option<String>> {
        codec.encode_flash(&lock(&self.state))
    }
}

#[cfg(feature = "axum")]
mod extract {
    use axum_core::extract::FromRequestParts;
    use http::{StatusCode, request::Parts};

    use super::{Flash, Session};

    impl<S: Send + Sync> FromRequestParts<S> for Session {
        type Rejection = (StatusCode, &'static str);

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            parts.extensions.get::<Session>().cloned().ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Can't extract session. Is `CookieSessionManagerLayer` enabled?",
            ))
        }
    }

    impl<S: Send + Sync> FromRequestParts<S> for Flash {
        type Rejection = (StatusCode, &'static str);

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            parts.extensions.get::<Flash>().cloned().ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Can't extract flash. Is `CookieSessionManagerLayer` enabled?",
            ))
        }
    }
}
