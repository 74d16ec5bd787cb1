use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use async_trait::async_trait;
use http::{Request, Response};
use hyper::{body::HttpBody, client::HttpConnector, Body, Client};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, RootCertStore};

use crate::clients::{GcmClient, MAX_RESPONSE_SIZE};
use crate::config::SenderConfig;
use crate::error::GcmError;

/// An async client for posting messages to the gateway using rustls for TLS.
///
/// This client is thread-safe. Clones of this client will share the same underlying resources,
/// so cloning is a cheap and effective method to provide access to the client.
///
/// This client is [`hyper`](https://crates.io/crates/hyper) based with [`rustls`](https://crates.io/crates/rustls)
/// for TLS, and will only work in Tokio contexts. This variant is ideal for docker/musl builds
/// that don't require native-tls.
#[derive(Clone)]
pub struct HyperRustlsGcmClient {
    client: Client<HttpsConnector<HttpConnector>>,
}

impl Default for HyperRustlsGcmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Client<HttpsConnector<HttpConnector>>> for HyperRustlsGcmClient {
    /// Creates a new client from a custom hyper HTTP client with rustls connector.
    fn from(client: Client<HttpsConnector<HttpConnector>>) -> Self {
        Self { client }
    }
}

impl HyperRustlsGcmClient {
    /// Creates a new client with rustls for TLS, trusting the platform's roots.
    pub fn new() -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Self {
            client: Client::builder().build(https),
        }
    }

    /// Creates a new client that only trusts the CA certificate(s) in the given
    /// PEM file.
    pub fn with_ca_info<P: AsRef<Path>>(ca_info_path: P) -> Result<Self, GcmError> {
        let mut reader = BufReader::new(File::open(ca_info_path)?);
        let certs = rustls_pemfile::certs(&mut reader)?;

        let mut roots = RootCertStore::empty();
        let (added, _ignored) = roots.add_parsable_certificates(&certs[..]);
        if added == 0 {
            return Err(GcmError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "no usable CA certificates in the configured file",
            )));
        }

        let tls = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build();

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
impl GcmClient for HyperRustlsGcmClient {
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
