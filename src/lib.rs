//! Signed, optionally encrypted, key/value session and flash cookies.
//!
//! The session is an ordered string mapping serialized into a single cookie value of the form
//! `URLSAFE(ENCRYPT?(SIGNATURE "-" PAIRS))`. Its expiration timestamp travels inside the signed
//! payload, so a client cannot extend its own session. The flash is a one-shot message bag sent
//! as `URLSAFE(PAIRS)`: whatever a request reads from it is gone on the following request unless
//! it is kept explicitly.
//!
//! [`SessionCodec`] is the pure transformation and can be used on its own.
//! [`CookieSessionManagerLayer`] wires it into a `tower` stack on top of `tower-cookies`.
//!
//! # Security
//! Keys and values must not contain `U+0000` or `U+0001`; those bytes delimit pairs on the wire
//! and are not escaped. Store structured data with [`Session::insert_value`], which writes JSON
//! and therefore never emits them.

mod codec;
mod config;
mod crypto;
mod error;
mod expiration;
pub mod format;
mod handle;
pub mod layer;
pub mod state;

pub use tower_cookies::{Key, cookie::SameSite};

pub use crate::codec::SessionCodec;
pub use crate::config::{
    CookieSessionConfig, DEFAULT_FLASH_COOKIE_NAME, DEFAULT_SESSION_COOKIE_NAME,
};
pub use crate::crypto::{CookieCrypto, KeyCrypto};
pub use crate::error::{Error, Result};
pub use crate::expiration::process_expiration;
pub use crate::handle::{Flash, Session};
pub use crate::layer::CookieSessionManagerLayer;
pub use crate::state::{FlashState, KvState, SessionState};
