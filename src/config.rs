use std::borrow::Cow;

use time::Duration;
use tower_cookies::Cookie;

use crate::SameSite;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "session";
pub const DEFAULT_FLASH_COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone)]
pub struct CookieSessionConfig {
    pub(crate) session_name: Cow<'static, str>,
    pub(crate) flash_name: Cow<'static, str>,
    pub(crate) ttl: Duration,
    pub(crate) ping_path: Option<Cow<'static, str>>,
    pub(crate) encrypt: bool,
    pub(crate) persistent: bool,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
    pub(crate) path: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) max_cookie_bytes: usize,
}

impl Default for CookieSessionConfig {
    fn default() -> Self {
        Self {
            session_name: DEFAULT_SESSION_COOKIE_NAME.into(),
            flash_name: DEFAULT_FLASH_COOKIE_NAME.into(),
            ttl: Duration::minutes(30),
            ping_path: None,
            encrypt: false,
            persistent: false,
            http_only: true,
            same_site: SameSite::Strict,
            secure: true,
            path: "/".into(),
            domain: None,
            max_cookie_bytes: 4096,
        }
    }
}

impl CookieSessionConfig {
    #[must_use]
    pub fn with_session_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.session_name = name.into();
        self
    }

    #[must_use]
    pub fn with_flash_name<N: Into<Cow<'static, str>>>(mut self, name: N) -> Self {
        self.flash_name = name.into();
        self
    }

    /// Session lifetime. Zero or negative disables expiration tracking.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Requests to exactly this path do not extend the session.
    #[must_use]
    pub fn with_ping_path<P: Into<Cow<'static, str>>>(mut self, ping_path: P) -> Self {
        self.ping_path = Some(ping_path.into());
        self
    }

    #[must_use]
    pub fn without_ping_path(mut self) -> Self {
        self.ping_path = None;
        self
    }

    #[must_use]
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Emit `Max-Age` equal to the TTL on the session cookie.
    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_path<P: Into<Cow<'static, str>>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    pub(crate) fn session_will_expire(&self) -> bool {
        self.ttl.is_positive()
    }

    pub(crate) fn ttl_millis(&self) -> i64 {
        if self.session_will_expire() {
            i64::try_from(self.ttl.whole_milliseconds()).unwrap_or(i64::MAX)
        } else {
            0
        }
    }

    pub(crate) fn session_cookie(&self, value: String) -> Cookie<'static> {
        let max_age = (self.persistent && self.session_will_expire()).then_some(self.ttl);
        self.build_cookie(self.session_name.clone(), value, max_age)
    }

    pub(crate) fn flash_cookie(&self, value: String) -> Cookie<'static> {
        self.build_cookie(self.flash_name.clone(), value, None)
    }

    fn build_cookie(
        &self,
        name: Cow<'static, str>,
        value: String,
        max_age: Option<Duration>,
    ) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone());

        if let Some(max_age) = max_age {
            cookie_builder = cookie_builder.max_age(max_age);
        }

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }

    pub(crate) fn removal_cookie(&self, name: Cow<'static, str>) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path(self.path.clone());
        if let Some(domain) = self.domain.clone() {
            cookie.set_domain(domain);
        }
        cookie
    }
}
