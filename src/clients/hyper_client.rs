use std::fs;
use std::path::Path;

use async_trait::async_trait;
use http::{Request, Response};
use hyper::{body::HttpBody, client::HttpConnector, Body, Client};
use hyper_tls::HttpsConnector;
use native_tls::{Certificate, TlsConnector};

use crate::clients::{GcmClient, MAX_RESPONSE_SIZE};
use crate::config::SenderConfig;
use crate::error::GcmError;

/// An async client for posting messages to the gateway.
///
/// This client is thread-safe. Clones of this client will share the same underlying resources,
/// so cloning is a cheap and effective method to provide access to the client.
///
/// This client is [`hyper`](https://crates.io/crates/hyper) based, and will only work in Tokio contexts.
#[derive(Clone)]
pub struct HyperGcmClient {
    client: Client<HttpsConnector<HttpConnector>>,
}

impl Default for HyperGcmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Client<HttpsConnector<HttpConnector>>> for HyperGcmClient {
    /// Creates a new client from a custom hyper HTTP client.
    fn from(client: Client<HttpsConnector<HttpConnector>>) -> Self {
        Self { client }
    }
}

impl HyperGcmClient {
    /// Creates a new client trusting the system CA store.
    pub fn new() -> Self {
        Self {
            client: Client::builder().build(HttpsConnector::new()),
        }
    }

    /// Creates a new client that additionally trusts the CA certificate in the
    /// given PEM file.
    pub fn with_ca_info<P: AsRef<Path>>(ca_info_path: P) -> Result<Self, GcmError> {
        let pem = fs::read(ca_info_path)?;

        let tls = TlsConnector::builder()
            .add_root_certificate(Certificate::from_pem(&pem)?)
            .build()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);

        let https = HttpsConnector::from((http, tokio_native_tls::TlsConnector::from(tls)));

        Ok(Self {
            client: Client::builder().build(https),
        })
    }

    /// Creates the client described by the transport part of `config`.
    pub fn from_config(config: &SenderConfig) -> Result<Self, GcmError> {
        match config.ca_info_path {
            Some(ref path) => Self::with_ca_info(path),
            None => Ok(Self::new()),
        }
    }
}

#[async_trait]
impl GcmClient for HyperGcmClient {
    async fn post(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, GcmError> {
        let requesting = self.client.request(request.map(Body::from));

        let response = requesting.await?;

        trace!("Response: {:?}", response);

        let (parts, mut chunks) = response.into_parts();
        let mut body = Vec::new();
        while let Some(chunk) = chunks.data().await {
            body.extend(&chunk?);
            if body.len() > MAX_RESPONSE_SIZE {
                return Err(GcmError::ResponseTooLarge);
            }
        }

        Ok(Response::from_parts(parts, body))
    }
}
