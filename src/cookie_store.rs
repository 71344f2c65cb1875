//! The bundled cookie-backed store: the whole session record rides in the
//! cookie value, so no server-side state exists.

use std::fmt::Debug;

use async_trait::async_trait;
use time::OffsetDateTime;
use tower_cookies::{Cookie, Cookies};

#[cfg(any(feature = "signed", feature = "private"))]
use tower_cookies::Key;

use crate::{
    format,
    options::CookieOptions,
    session::Record,
    session_store::{self, SessionStore},
};

const DEFAULT_MAX_COOKIE_BYTES: usize = 4096;

/// How session cookies move between the store and the request's cookie jar.
///
/// The implementations differ only in which `tower-cookies` jar they go
/// through: plaintext, signed, or private (encrypted). A signed or private
/// cookie that fails verification reads as absent.
pub trait CookieController: Debug + Clone + Send + Sync + 'static {
    fn read(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>>;
    fn write(&self, cookies: &Cookies, cookie: Cookie<'static>);
    fn clear(&self, cookies: &Cookies, cookie: Cookie<'static>);
}

/// Backs sessions with a tamper-evident signed cookie. The payload is
/// authenticated, not hidden: clients can read it, but not alter it.
#[cfg(feature = "signed")]
#[derive(Debug, Clone)]
pub struct SignedCookie {
    key: Key,
}

#[cfg(feature = "signed")]
impl SignedCookie {
    pub fn new(key: Key) -> Self {
        Self { key }
    }
}

#[cfg(feature = "signed")]
impl CookieController for SignedCookie {
    fn read(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>> {
        cookies.signed(&self.key).get(name).map(Cookie::into_owned)
    }

    fn write(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.signed(&self.key).add(cookie);
    }

    fn clear(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.signed(&self.key).remove(cookie);
    }
}

/// Backs sessions with an encrypted cookie: the payload is hidden from the
/// client as well as authenticated.
#[cfg(feature = "private")]
#[derive(Debug, Clone)]
pub struct PrivateCookie {
    key: Key,
}

#[cfg(feature = "private")]
impl PrivateCookie {
    pub fn new(key: Key) -> Self {
        Self { key }
    }
}

#[cfg(feature = "private")]
impl CookieController for PrivateCookie {
    fn read(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>> {
        cookies.private(&self.key).get(name).map(Cookie::into_owned)
    }

    fn write(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.private(&self.key).add(cookie);
    }

    fn clear(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.private(&self.key).remove(cookie);
    }
}

/// Backs sessions with an unprotected cookie. Testing and debugging only; see
/// the crate-level security note.
#[cfg(feature = "dangerous-plaintext")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCookie;

#[cfg(feature = "dangerous-plaintext")]
impl CookieController for PlaintextCookie {
    fn read(&self, cookies: &Cookies, name: &str) -> Option<Cookie<'static>> {
        cookies.get(name).map(Cookie::into_owned)
    }

    fn write(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.add(cookie);
    }

    fn clear(&self, cookies: &Cookies, cookie: Cookie<'static>) {
        cookies.remove(cookie);
    }
}

/// A [`SessionStore`] that serializes the record into the session cookie.
#[derive(Debug, Clone)]
pub struct CookieStore<C: CookieController> {
    controller: C,
    defaults: CookieOptions,
    max_cookie_bytes: usize,
    clear_on_decode_error: bool,
}

impl<C: CookieController> CookieStore<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            defaults: CookieOptions::default(),
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
            clear_on_decode_error: true,
        }
    }

    /// Cookie attributes applied whenever a session has no per-response
    /// override.
    #[must_use]
    pub fn with_defaults(mut self, defaults: CookieOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Upper bound on the encoded cookie value; saving a record that encodes
    /// larger fails with [`session_store::Error::Encode`]. Browsers drop
    /// cookies past 4096 bytes, hence the default.
    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    /// Policy for cookies that authenticate but fail to decode, and for
    /// payloads past their embedded expiry. When `true` (the default) the
    /// stale cookie is cleared and the session starts fresh; when `false`,
    /// decode failures surface as [`session_store::Error::Decode`].
    #[must_use]
    pub fn with_clear_on_decode_error(mut self, clear_on_decode_error: bool) -> Self {
        self.clear_on_decode_error = clear_on_decode_error;
        self
    }

    fn remove_cookie(&self, cookies: &Cookies, name: &str) {
        let mut cookie = Cookie::new(name.to_owned(), "");
        self.defaults.apply_removal_attributes(&mut cookie);
        self.controller.clear(cookies, cookie);
    }
}

#[cfg(feature = "signed")]
impl CookieStore<SignedCookie> {
    pub fn signed(key: Key) -> Self {
        Self::new(SignedCookie::new(key))
    }
}

#[cfg(feature = "private")]
impl CookieStore<PrivateCookie> {
    pub fn private(key: Key) -> Self {
        Self::new(PrivateCookie::new(key))
    }
}

#[cfg(feature = "dangerous-plaintext")]
impl CookieStore<PlaintextCookie> {
    pub fn dangerous_plaintext() -> Self {
        Self::new(PlaintextCookie)
    }
}

#[async_trait]
impl<C: CookieController> SessionStore for CookieStore<C> {
    async fn load(&self, cookies: &Cookies, name: &str) -> session_store::Result<Option<Record>> {
        let Some(cookie) = self.controller.read(cookies, name) else {
            return Ok(None);
        };

        match format::decode_record(cookie.value()) {
            Ok((_record, Some(expires_at))) if expires_at <= OffsetDateTime::now_utc() => {
                if self.clear_on_decode_error {
                    self.remove_cookie(cookies, name);
                }
                Ok(None)
            }
            Ok((record, _expires_at)) => Ok(Some(record)),
            Err(err) => {
                tracing::warn!(err = %err, "session cookie decode failed");
                if self.clear_on_decode_error {
                    self.remove_cookie(cookies, name);
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn save(
        &self,
        cookies: &Cookies,
        name: &str,
        record: &Record,
        options: Option<&CookieOptions>,
    ) -> session_store::Result<()> {
        let options = options.unwrap_or(&self.defaults);
        let expires_at = options
            .max_age
            .map(|max_age| OffsetDateTime::now_utc() + max_age);

        let value = format::encode_record(record, expires_at)?;
        if value.len() > self.max_cookie_bytes {
            return Err(session_store::Error::Encode(format!(
                "Cookie value exceeds max_cookie_bytes ({} > {})",
                value.len(),
                self.max_cookie_bytes
            )));
        }

        let cookie = options.build_cookie(name.to_owned(), value);
        self.controller.write(cookies, cookie);

        Ok(())
    }
}
