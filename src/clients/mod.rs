//! Contains implementations of the HTTP clients used to reach the gateway.
//!
//! [`request_builder`] contains the functions used to build the send request and consume the response.
//! Clients only move bytes: anything implementing [`GcmClient`] can be handed to a
//! [`GcmSender`](crate::GcmSender), using [`http`]'s flexible api.

use async_trait::async_trait;
use http::{Request, Response};

use crate::error::GcmError;

pub mod request_builder;

#[cfg(feature = "hyper-client")]
pub mod hyper_client;

#[cfg(feature = "hyper-rustls-client")]
pub mod hyper_rustls_client;

#[cfg(feature = "isahc-client")]
pub mod isahc_client;

/// Gateway responses are small JSON documents. Anything larger than this is refused.
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// The transport used by a [`GcmSender`](crate::GcmSender).
///
/// Implementations issue one POST and hand back the status, headers and body as
/// they came. They should not interpret the status code, and transport failures
/// are returned as [`GcmError::Transport`] without translation.
#[async_trait]
pub trait GcmClient: Send + Sync {
    /// Sends the request. Never times out unless the underlying client does.
    async fn post(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, GcmError>;
}
