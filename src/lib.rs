//! Lazy per-request sessions for `tower` services.
//!
//! [`SessionManagerLayer`] attaches a [`Session`] to every request's
//! extensions. The session fetches its record from the configured
//! [`SessionStore`] when it is first used and persists nothing until a handler
//! calls [`Session::save`]: requests that never touch the session never
//! contact the store, and mutations dropped without a save are never written.
//!
//! Flash messages ride in the session as named queues consumed exactly once:
//! [`Session::add_flash`] queues a value for the next request,
//! [`Session::take_flashes`] returns and removes whatever is queued.
//!
//! The bundled [`CookieStore`] keeps the whole record in the session cookie;
//! other backends can be plugged in by implementing [`SessionStore`].
//!
//! # Security
//! The default backend signs the cookie (`signed` feature), so clients can
//! read their session but not alter it. The `private` feature encrypts the
//! payload as well, hiding it from the client entirely.
//!
//! The `dangerous-plaintext` feature exists for testing and debugging only.
//! A plaintext session cookie has **no tamper resistance**: any client can
//! rewrite its own session and impersonate other users, including
//! administrators. Never enable it in a real application.

mod cookie_store;
#[cfg(feature = "axum")]
mod extract;
pub mod format;
pub mod layer;
mod options;
pub mod session;
pub mod session_store;

pub use tower_cookies::{Cookies, cookie::SameSite};

#[cfg(any(feature = "signed", feature = "private"))]
pub use tower_cookies::Key;

pub use crate::cookie_store::{CookieController, CookieStore};
pub use crate::layer::SessionManagerLayer;
pub use crate::options::CookieOptions;
pub use crate::session::{DEFAULT_FLASH_CATEGORY, Record, Session};
pub use crate::session_store::SessionStore;

#[cfg(feature = "signed")]
pub use crate::cookie_store::SignedCookie;

#[cfg(feature = "private")]
pub use crate::cookie_store::PrivateCookie;

#[cfg(feature = "dangerous-plaintext")]
pub use crate::cookie_store::PlaintextCookie;
