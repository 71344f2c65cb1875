use std::borrow::Cow;

use time::Duration;
use tower_cookies::{Cookie, cookie::SameSite};

/// Attributes of the cookie a store writes on save.
///
/// A store carries one set of these as its default; a handler may replace them
/// for a single response with [`Session::set_options`](crate::Session::set_options).
/// The replacement is wholesale: an override that leaves `domain` unset writes
/// a cookie without a `Domain` attribute even if the store default has one.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub(crate) path: Cow<'static, str>,
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) max_age: Option<Duration>,
    pub(crate) secure: bool,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".into(),
            domain: None,
            max_age: None,
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
        }
    }
}

impl CookieOptions {
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

    /// `None` (the default) emits no `Max-Age`, i.e. the cookie lasts for the
    /// browser session. A non-positive duration emits `Max-Age=0`, telling the
    /// browser to discard the cookie immediately.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn without_max_age(mut self) -> Self {
        self.max_age = None;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
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

    pub(crate) fn build_cookie(&self, name: String, value: String) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .same_site(self.same_site)
            .secure(self.secure)
            .path(self.path.clone());

        if let Some(max_age) = self.max_age {
            cookie_builder = cookie_builder.max_age(std::cmp::max(max_age, Duration::ZERO));
        }

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }

    pub(crate) fn apply_removal_attributes(&self, cookie: &mut Cookie<'static>) {
        cookie.set_path(self.path.clone());
        if let Some(domain) = self.domain.clone() {
            cookie.set_domain(domain);
        }
    }
}
