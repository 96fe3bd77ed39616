// Viewer extractor - identifies the acting user from the `X-Viewer-Id` header
// Authentication happens upstream; handlers only see an already trusted id

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::core::UserId;
use crate::error::AppError;

pub const VIEWER_HEADER: &str = "x-viewer-id";

/// The user on whose behalf a request is made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer(pub UserId);

impl std::ops::Deref for Viewer {
    type Target = UserId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn viewer_from_headers(headers: &HeaderMap) -> Result<Viewer, AppError> {
    let raw = headers
        .get(VIEWER_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing X-Viewer-Id header".to_string()))?;

    let id = raw
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(UserId::new)
        .filter(|id| id.is_valid())
        .ok_or_else(|| AppError::Unauthorized("Invalid X-Viewer-Id header".to_string()))?;

    Ok(Viewer(id))
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let viewer = viewer_from_headers(&parts.headers);
        async move { viewer }
    }
}
