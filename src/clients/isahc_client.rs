use std::path::Path;

use async_trait::async_trait;
use futures_lite::AsyncReadExt;
use http::{Request, Response};
use isahc::config::{CaCertificate, Configurable};
use isahc::HttpClient;

use crate::clients::{GcmClient, MAX_RESPONSE_SIZE};
use crate::config::SenderConfig;
use crate::error::GcmError;

/// An async client for posting messages to the gateway. This client is expensive to create, and
/// should be reused.
///
/// This client is thread-safe. Clones of this client will share the same underlying resources,
/// so cloning is a cheap and effective method to provide access to the client.
///
/// This client is built on [`isahc`](https://crates.io/crates/isahc), and will therefore work on any async executor.
#[derive(Clone)]
pub struct IsahcGcmClient {
    client: HttpClient,
}

impl From<HttpClient> for IsahcGcmClient {
    /// Creates a new client from a custom Isahc HTTP client.
    fn from(client: HttpClient) -> Self {
        Self { client }
    }
}

impl IsahcGcmClient {
    /// Creates a new client trusting the system CA store. Can fail under resource depletion.
    pub fn new() -> Result<Self, GcmError> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }

    /// Creates a new client that verifies the gateway against the CA certificate(s)
    /// in the given PEM file.
    pub fn with_ca_info<P: AsRef<Path>>(ca_info_path: P) -> Result<Self, GcmError> {
        let client = HttpClient::builder()
            .ssl_ca_certificate(CaCertificate::file(ca_info_path.as_ref()))
            .build()?;

        Ok(Self { client })
    }

    /// Creates the client described by the transport part of `config`.
    pub fn from_config(config: &SenderConfig) -> Result<Self, GcmError> {
        match config.ca_info_path {
            Some(ref path) => Self::with_ca_info(path),
            None => Self::new(),
        }
    }
}

#[async_trait]
impl GcmClient for IsahcGcmClient {
    async fn post(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, GcmError> {
        let requesting = self.client.send_async(request);

        let response = requesting.await?;

        trace!("Response: {:?}", response);

        let (parts, body) = response.into_parts();

        let mut buffer = Vec::new();
        if body.take(MAX_RESPONSE_SIZE as u64 + 1).read_to_end(&mut buffer).await? > MAX_RESPONSE_SIZE {
            return Err(GcmError::ResponseTooLarge);
        }

        Ok(Response::from_parts(parts, buffer))
    }
}
