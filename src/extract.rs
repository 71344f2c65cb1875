//! Axum extractor for [`Session`].

use axum_core::extract::FromRequestParts;
use http::{StatusCode, request::Parts};

use crate::session::Session;

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract the session. Is `SessionManagerLayer` installed?",
        ))
    }
}
