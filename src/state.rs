//! Ordered key/value state carried by the session and flash cookies.

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;

/// Prefix shared by every key the codec reserves for itself.
pub const KEY_PREFIX: &str = "___";

/// Session identity, generated on first encode.
pub const KEY_ID: &str = "___ID";

/// Expiration timestamp in milliseconds since the Unix epoch, as decimal text.
pub const KEY_EXPIRATION: &str = "___TS";

/// Set to `"true"` on the fresh session that replaces a stale one.
pub const KEY_EXPIRE_INDICATOR: &str = "___expired";

/// Conventional slot for the authenticated user name.
pub const KEY_USERNAME: &str = "___UN";

const FLASH_ERROR: &str = "error";
const FLASH_SUCCESS: &str = "success";

/// Insertion-ordered string mapping with change tracking.
///
/// `put`, `remove` and `clear` mark the state as changed; `load` does not.
#[derive(Debug, Clone, Default)]
pub struct KvState {
    entries: IndexMap<String, String>,
    changed: bool,
}

impl PartialEq for KvState {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for KvState {}

impl KvState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value in place.
    pub fn put<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
        self.changed = true;
    }

    /// Like [`KvState::put`] but leaves the changed flag alone.
    pub fn load<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.changed = true;
        self.entries.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.changed = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn mark_unchanged(&mut self) {
        self.changed = false;
    }
}

/// Session content: a [`KvState`] plus accessors for the reserved keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    kv: KvState,
}

impl Deref for SessionState {
    type Target = KvState;

    fn deref(&self) -> &Self::Target {
        &self.kv
    }
}

impl DerefMut for SessionState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.kv
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session identity, generated and stored on first access.
    pub fn id(&mut self) -> &str {
        if !self.kv.contains(KEY_ID) {
            let id = uuid::Uuid::new_v4().simple().to_string();
            self.kv.put(KEY_ID, id);
        }
        self.kv.get(KEY_ID).unwrap_or_default()
    }

    /// Whether this state replaced a session whose expiration had passed.
    pub fn is_expired(&self) -> bool {
        self.kv.get(KEY_EXPIRE_INDICATOR) == Some("true")
    }

    /// Stored expiration timestamp in milliseconds since the Unix epoch.
    pub fn expires_at(&self) -> Option<i64> {
        self.kv.get(KEY_EXPIRATION)?.parse().ok()
    }

    pub fn username(&self) -> Option<&str> {
        self.kv.get(KEY_USERNAME)
    }

    pub fn set_username<V: Into<String>>(&mut self, username: V) {
        self.kv.put(KEY_USERNAME, username);
    }

    /// Entries outside the reserved key space.
    pub fn user_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.kv.iter().filter(|(k, _)| !k.starts_with(KEY_PREFIX))
    }
}

/// One-shot messages: `current` is readable during this request, `out` goes to the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashState {
    current: KvState,
    out: KvState,
}

impl FlashState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a message visible now and on the next request.
    pub fn put<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let (key, value) = (key.into(), value.into());
        self.current.put(key.clone(), value.clone());
        self.out.put(key, value);
    }

    /// Make a message visible during this request only.
    pub fn now<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.current.put(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.current.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.current.contains(key)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.current.iter()
    }

    /// Carry every current message over to the next request.
    pub fn keep(&mut self) {
        for (k, v) in self.current.iter() {
            self.out.put(k, v);
        }
    }

    pub fn keep_key(&mut self, key: &str) {
        if let Some(value) = self.current.get(key) {
            self.out.put(key, value);
        }
    }

    /// Drop everything scheduled for the next request.
    pub fn discard(&mut self) {
        self.out.clear();
    }

    pub fn discard_key(&mut self, key: &str) {
        self.out.remove(key);
    }

    pub fn error<V: Into<String>>(&mut self, message: V) {
        self.put(FLASH_ERROR, message);
    }

    pub fn error_message(&self) -> Option<&str> {
        self.get(FLASH_ERROR)
    }

    pub fn success<V: Into<String>>(&mut self, message: V) {
        self.put(FLASH_SUCCESS, message);
    }

    pub fn success_message(&self) -> Option<&str> {
        self.get(FLASH_SUCCESS)
    }

    pub fn out(&self) -> &KvState {
        &self.out
    }

    pub(crate) fn current_mut(&mut self) -> &mut KvState {
        &mut self.current
    }
}
