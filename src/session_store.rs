//! The pluggable persistence contract behind [`Session`](crate::Session).
//!
//! A store receives the request's cookie jar as its view of the request and
//! response: it may read cookies that arrived with the request and queue
//! cookies to be written when the response leaves the middleware stack. The
//! bundled [`CookieStore`](crate::CookieStore) keeps the whole record in the
//! cookie itself; an external backend (database, cache) would instead keep an
//! identifier in the cookie and the record behind it.

use std::fmt::Debug;

use async_trait::async_trait;
use tower_cookies::Cookies;

use crate::{options::CookieOptions, session::Record};

/// Failure modes a session store can report.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The record could not be encoded for persistence.
    #[error("encode error: {0}")]
    Encode(String),

    /// An existing payload could not be decoded into a record.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backend itself failed.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Loads and persists session [`Record`]s.
///
/// Implementations are shared across all in-flight requests and must be
/// internally safe for concurrent use.
#[async_trait]
pub trait SessionStore: Debug + Send + Sync + 'static {
    /// Retrieve the record for the session named `name`, or `Ok(None)` if the
    /// request carries no usable session.
    async fn load(&self, cookies: &Cookies, name: &str) -> Result<Option<Record>>;

    /// Persist `record`, queueing whatever cookie the response needs.
    ///
    /// `options` is the per-response override supplied via
    /// [`Session::set_options`](crate::Session::set_options); `None` means the
    /// store should fall back to its own defaults.
    async fn save(
        &self,
        cookies: &Cookies,
        name: &str,
        record: &Record,
        options: Option<&CookieOptions>,
    ) -> Result<()>;
}
