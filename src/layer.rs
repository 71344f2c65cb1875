//! The middleware that binds a [`Session`] to every request.
//!
//! The layer wraps the inner service in `tower-cookies`' `CookieManager`, so a
//! cookie jar exists for the whole request and anything a store queues on it
//! (a `Set-Cookie` from [`Session::save`], a removal for a stale cookie) is
//! applied to the response on the way out. The layer itself performs no
//! persistence: a session that is never saved never writes a header, and a
//! session that is never touched never contacts the store.

use std::{
    borrow::Cow,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response};
use tower_cookies::CookieManager;
use tower_layer::Layer;
use tower_service::Service;

use crate::{session::Session, session_store::SessionStore};

/// Installs session handling for a named session backed by `St`.
#[derive(Debug)]
pub struct SessionManagerLayer<St> {
    name: Cow<'static, str>,
    store: Arc<St>,
}

impl<St: SessionStore> SessionManagerLayer<St> {
    /// Bind the session named `name` to `store`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn new(name: impl Into<Cow<'static, str>>, store: St) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "session name must not be empty");

        Self {
            name,
            store: Arc::new(store),
        }
    }
}

#[cfg(feature = "signed")]
impl SessionManagerLayer<crate::CookieStore<crate::SignedCookie>> {
    /// Sessions in a signed cookie named `name`.
    pub fn signed(name: impl Into<Cow<'static, str>>, key: tower_cookies::Key) -> Self {
        Self::new(name, crate::CookieStore::signed(key))
    }
}

#[cfg(feature = "private")]
impl SessionManagerLayer<crate::CookieStore<crate::PrivateCookie>> {
    /// Sessions in an encrypted cookie named `name`.
    pub fn private(name: impl Into<Cow<'static, str>>, key: tower_cookies::Key) -> Self {
        Self::new(name, crate::CookieStore::private(key))
    }
}

#[cfg(feature = "dangerous-plaintext")]
impl SessionManagerLayer<crate::CookieStore<crate::PlaintextCookie>> {
    /// Sessions in an unprotected cookie named `name`. Testing and debugging
    /// only; see the crate-level security note.
    pub fn dangerous_plaintext(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, crate::CookieStore::dangerous_plaintext())
    }
}

impl<St> Clone for SessionManagerLayer<St> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: self.store.clone(),
        }
    }
}

impl<S, St: SessionStore> Layer<S> for SessionManagerLayer<St> {
    type Service = CookieManager<SessionManager<S, St>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(SessionManager {
            inner,
            name: self.name.clone(),
            store: self.store.clone(),
        })
    }
}

/// The service produced by [`SessionManagerLayer`].
#[derive(Debug)]
pub struct SessionManager<S, St> {
    inner: S,
    name: Cow<'static, str>,
    store: Arc<St>,
}

impl<S: Clone, St> Clone for SessionManager<S, St> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            name: self.name.clone(),
            store: self.store.clone(),
        }
    }
}

impl<ReqBody, ResBody, S, St> Service<Request<ReqBody>> for SessionManager<S, St>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
    St: SessionStore,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let name = self.name.clone();
        let store: Arc<dyn SessionStore> = self.store.clone();

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let cookies = match req.extensions().get::<tower_cookies::Cookies>().cloned() {
                Some(cookies) => cookies,
                None => {
                    // The jar is installed by the CookieManager this layer
                    // wraps around the stack; missing means the stack is
                    // wired wrong.
                    tracing::error!("missing cookie jar in request extensions");
                    let mut res = Response::default();
                    *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(res);
                }
            };

            let session = Session::new(name, store, cookies);
            req.extensions_mut().insert(session);

            inner.call(req).await
        })
    }
}
