//! The per-request session façade.
//!
//! A [`Session`] is created by [`SessionManagerLayer`](crate::SessionManagerLayer)
//! for every request and dropped when the request completes. It fetches its
//! backing [`Record`] from the store at most once, on the first operation that
//! touches session state, and persists nothing until [`Session::save`] is
//! called.

use std::{
    borrow::Cow,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tower_cookies::Cookies;

use crate::{
    options::CookieOptions,
    session_store::{self, SessionStore},
};

/// Category used by [`Session::add_flash`] and [`Session::take_flashes`].
pub const DEFAULT_FLASH_CATEGORY: &str = "default";

/// Errors surfaced by [`Session`] operations.
///
/// Store failures show up on the first state-touching operation (the lazy
/// fetch) and on [`Session::save`]; serialization failures wherever a typed
/// value crosses the API boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] session_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The session payload a store persists: named values plus flash queues.
///
/// Values are kept as [`serde_json::Value`] so the record stays serializable
/// regardless of what handlers put into it; [`Session`] offers the typed view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub values: HashMap<String, Value>,

    /// One independently consumed queue per category, in insertion order.
    #[serde(default)]
    pub flashes: HashMap<String, Vec<Value>>,
}

/// Handle to one request's session state.
///
/// Clones share the same underlying state; the layer puts one clone into the
/// request extensions and handlers take further clones from there. All
/// operations assume the single-request, effectively-sequential access the
/// middleware provides: mutating one session from concurrently running tasks
/// is a caller error and may fetch from the store more than once.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    name: Cow<'static, str>,
    store: Arc<dyn SessionStore>,
    cookies: Cookies,
    /// `None` until the first state-touching operation.
    record: Mutex<Option<Record>>,
    options: Mutex<Option<CookieOptions>>,
}

impl Session {
    /// Create an unloaded session bound to one request's cookie jar.
    ///
    /// This is what the middleware does per request; calling it directly is
    /// only useful when driving a session outside a tower stack, e.g. in
    /// handler unit tests.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        store: Arc<dyn SessionStore>,
        cookies: Cookies,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                store,
                cookies,
                record: Mutex::new(None),
                options: Mutex::new(None),
            }),
        }
    }

    /// The session name this wrapper was installed under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the value stored under `key`, deserialized into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_value(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::from)
    }

    /// Get the raw value stored under `key`.
    pub async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        self.with_record(|record| record.values.get(key).cloned())
            .await
    }

    /// Store `value` under `key`. Nothing is persisted until [`Session::save`].
    pub async fn insert(&self, key: &str, value: impl Serialize + Send) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.insert_value(key, value).await
    }

    /// Store a raw value under `key`.
    pub async fn insert_value(&self, key: &str, value: Value) -> Result<()> {
        self.with_record(|record| {
            record.values.insert(key.to_owned(), value);
        })
        .await
    }

    /// Remove `key`, returning its value deserialized into `T`.
    pub async fn remove<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.remove_value(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::from)
    }

    /// Remove `key`, returning its raw value.
    pub async fn remove_value(&self, key: &str) -> Result<Option<Value>> {
        self.with_record(|record| record.values.remove(key)).await
    }

    /// Drop every value and every queued flash message.
    pub async fn clear(&self) -> Result<()> {
        self.with_record(|record| {
            record.values.clear();
            record.flashes.clear();
        })
        .await
    }

    /// Queue a flash message under [`DEFAULT_FLASH_CATEGORY`].
    pub async fn add_flash(&self, value: impl Serialize + Send) -> Result<()> {
        self.add_flash_to(DEFAULT_FLASH_CATEGORY, value).await
    }

    /// Queue a flash message under `category`.
    ///
    /// Categories are independent: consuming one leaves the others queued.
    pub async fn add_flash_to(&self, category: &str, value: impl Serialize + Send) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.with_record(|record| {
            record
                .flashes
                .entry(category.to_owned())
                .or_default()
                .push(value);
        })
        .await
    }

    /// Take every flash message queued under [`DEFAULT_FLASH_CATEGORY`].
    pub async fn take_flashes(&self) -> Result<Vec<Value>> {
        self.take_flashes_from(DEFAULT_FLASH_CATEGORY).await
    }

    /// Take every flash message queued under `category`, in the order they
    /// were added. Taking removes them: the next [`Session::save`] persists
    /// the session without them.
    pub async fn take_flashes_from(&self, category: &str) -> Result<Vec<Value>> {
        self.with_record(|record| record.flashes.remove(category).unwrap_or_default())
            .await
    }

    /// Replace the cookie attributes used by the next [`Session::save`] on
    /// this response. Without an override the store's defaults apply.
    pub fn set_options(&self, options: CookieOptions) {
        if let Ok(mut guard) = self.inner.options.lock() {
            *guard = Some(options);
        }
    }

    /// Persist the current record through the store.
    ///
    /// This is the only operation that performs I/O beyond the initial lazy
    /// fetch; for the bundled cookie store it queues the `Set-Cookie` header
    /// that the middleware writes onto the response. Errors come straight from
    /// the store and are not retried.
    pub async fn save(&self) -> Result<()> {
        let record = self.with_record(|record| record.clone()).await?;
        let options = self
            .inner
            .options
            .lock()
            .map_err(|_| session_store::Error::Backend("session options lock is poisoned".into()))?
            .clone();

        self.inner
            .store
            .save(
                &self.inner.cookies,
                &self.inner.name,
                &record,
                options.as_ref(),
            )
            .await?;

        Ok(())
    }

    /// Run `f` against the loaded record, fetching it first if this is the
    /// session's first state-touching operation.
    async fn with_record<T>(&self, f: impl FnOnce(&mut Record) -> T) -> Result<T> {
        {
            let mut guard = self.lock_record()?;
            if let Some(record) = guard.as_mut() {
                return Ok(f(record));
            }
        }

        let loaded = self
            .inner
            .store
            .load(&self.inner.cookies, &self.inner.name)
            .await?
            .unwrap_or_default();

        let mut guard = self.lock_record()?;
        // If the caller raced two first accesses the earlier fetch wins.
        Ok(f(guard.get_or_insert(loaded)))
    }

    fn lock_record(&self) -> session_store::Result<MutexGuard<'_, Option<Record>>> {
        self.inner
            .record
            .lock()
            .map_err(|_| session_store::Error::Backend("session record lock is poisoned".into()))
    }
}
