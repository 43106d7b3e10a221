use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use http::{Request, Response, StatusCode};
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    Key,
    codec::SessionCodec,
    config::CookieSessionConfig,
    crypto::{CookieCrypto, KeyCrypto},
    error::Error,
    handle::{Flash, Session},
};

#[derive(Debug, Clone)]
pub struct CookieSessionManagerLayer<C: CookieCrypto = KeyCrypto> {
    config: CookieSessionConfig,
    crypto: C,
}

impl CookieSessionManagerLayer<KeyCrypto> {
    /// Sign, and optionally encrypt, session cookies with `key`.
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            config: CookieSessionConfig::default(),
            crypto: KeyCrypto::from(key),
        }
    }
}

impl<C: CookieCrypto> CookieSessionManagerLayer<C> {
    #[must_use]
    pub fn with_config(mut self, config: CookieSessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_crypto<C2: CookieCrypto>(self, crypto: C2) -> CookieSessionManagerLayer<C2> {
        CookieSessionManagerLayer {
            config: self.config,
            crypto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieSessionManager<S, C: CookieCrypto> {
    inner: S,
    config: CookieSessionConfig,
    codec: SessionCodec<C>,
}

impl<S, C: CookieCrypto> Layer<S> for CookieSessionManagerLayer<C> {
    type Service = CookieManager<CookieSessionManager<S, C>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(CookieSessionManager {
            inner,
            config: self.config.clone(),
            codec: SessionCodec::new(self.crypto.clone(), &self.config),
        })
    }
}

fn internal_error<B: Default>() -> Response<B> {
    let mut res = Response::default();
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res
}

fn check_size(config: &CookieSessionConfig, value: &str) -> Result<(), Error> {
    if value.len() > config.max_cookie_bytes {
        return Err(Error::Encode(format!(
            "Cookie value exceeds max_cookie_bytes ({} > {})",
            value.len(),
            config.max_cookie_bytes
        )));
    }
    Ok(())
}

fn write_session<C: CookieCrypto>(
    cookies: &Cookies,
    config: &CookieSessionConfig,
    codec: &SessionCodec<C>,
    session: &Session,
    had_cookie: bool,
) -> Result<(), Error> {
    match session.encode(codec)? {
        Some(value) => {
            check_size(config, &value)?;
            cookies.add(config.session_cookie(value));
            Ok(())
        }
        None => {
            if had_cookie && session.is_empty() {
                cookies.remove(config.removal_cookie(config.session_name.clone()));
            }
            Ok(())
        }
    }
}

fn write_flash<C: CookieCrypto>(
    cookies: &Cookies,
    config: &CookieSessionConfig,
    codec: &SessionCodec<C>,
    flash: &Flash,
    had_cookie: bool,
) -> Result<(), Error> {
    match flash.encode(codec)? {
        Some(value) => {
            check_size(config, &value)?;
            cookies.add(config.flash_cookie(value));
        }
        None if had_cookie => cookies.remove(config.removal_cookie(config.flash_name.clone())),
        None => {}
    }
    Ok(())
}

impl<ReqBody, ResBody, S, C> Service<Request<ReqBody>> for CookieSessionManager<S, C>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
    C: CookieCrypto,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let config = self.config.clone();
        let codec = self.codec.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(cookies) = req.extensions().get::<Cookies>().cloned() else {
                return Ok(internal_error());
            };

            let session_cookie = cookies.get(&config.session_name);
            let flash_cookie = cookies.get(&config.flash_name);

            let session = Session::new(codec.decode_session(
                session_cookie.as_ref().map_or("", |c| c.value()),
                req.uri().path(),
            ));
            let flash = Flash::new(
                codec.decode_flash(flash_cookie.as_ref().map_or("", |c| c.value())),
            );
            req.extensions_mut().insert(session.clone());
            req.extensions_mut().insert(flash.clone());

            let res = inner.call(req).await?;
            if res.status().is_server_error() {
                return Ok(res);
            }

            if let Err(err) = write_session(
                &cookies,
                &config,
                &codec,
                &session,
                session_cookie.is_some(),
            ) {
                tracing::error!(err = %err, "cookie session save failed");
                return Ok(internal_error());
            }

            if let Err(err) =
                write_flash(&cookies, &config, &codec, &flash, flash_cookie.is_some())
            {
                tracing::error!(err = %err, "cookie flash save failed");
                return Ok(internal_error());
            }

            Ok(res)
        })
    }
}
