//! Transport trait.

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::request::{ApiRequest, ApiResponse};
use crate::Result;

/// The minimal capability the session layer needs from the network.
///
/// A transport sends one request and hands back whatever the backend
/// answered, any status included; deciding what a status means is the
/// caller's job. Implementations must:
///
/// - render [`ApiRequest::bearer`] as `Authorization: Bearer <token>`
/// - send bodies as `application/json`
/// - carry the ambient refresh credential (cookies) on every request
/// - return [`Error::Aborted`](crate::Error::Aborted) once `cancel` fires
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &ApiRequest, cancel: &CancelSignal) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &ApiRequest, cancel: &CancelSignal) -> Result<ApiResponse> {
        (**self).send(request, cancel).await
    }
}
