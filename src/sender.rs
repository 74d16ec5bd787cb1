use http::header::RETRY_AFTER;
use serde_json::{Map, Value};

use crate::clients::{request_builder, GcmClient};
use crate::config::SenderConfig;
use crate::error::{GcmError, RetryAfter};
use crate::message::{GcmMessage, GcmMessageBuilder, Recipients};
use crate::notification::Notification;
use crate::response::GcmResponse;

/// Sends messages to the gateway and reads back the per-recipient results.
///
/// The sender never retries. Use
/// [`unavailable_registration_ids`](GcmResponse::unavailable_registration_ids)
/// and the `retry_after` of [`GcmError::UnknownError`] to decide when to send
/// again.
#[derive(Debug, Clone)]
pub struct GcmSender<C> {
    config: SenderConfig,
    client: C,
}

#[cfg(feature = "isahc-client")]
impl GcmSender<crate::clients::isahc_client::IsahcGcmClient> {
    /// Creates a sender using the default [`isahc`](https://crates.io/crates/isahc) client, honouring
    /// the CA path of the configuration.
    pub fn new(config: SenderConfig) -> Result<Self, GcmError> {
        let client = crate::clients::isahc_client::IsahcGcmClient::from_config(&config)?;

        Ok(GcmSender { config, client })
    }
}

impl<C> GcmSender<C>
where
    C: GcmClient,
{
    /// Creates a sender posting through `client`. The CA path of `config` is
    /// the client's business and is not looked at here.
    pub fn with_client(config: SenderConfig, client: C) -> Self {
        GcmSender { config, client }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Sends a message built on the spot from its recipients and payloads.
    pub async fn send_message<R>(
        &self,
        recipients: R,
        data: Option<Map<String, Value>>,
        notification: Option<Notification>,
    ) -> Result<GcmResponse, GcmError>
    where
        R: Into<Recipients>,
    {
        let mut builder = GcmMessageBuilder::new(recipients);
        builder.bulk_set(data, notification);

        self.send(&builder.build()).await
    }

    /// Sends the message in one POST.
    ///
    /// Fails before anything is sent with `IllegalApiKey` when the
    /// configuration has no API key, or with `MalformedRequest` when the
    /// message breaks one of the gateway's limits.
    pub async fn send(&self, message: &GcmMessage) -> Result<GcmResponse, GcmError> {
        trace!("Message: {:?}", message);

        let request = request_builder::build_request::<Vec<u8>>(&self.config, message)?;

        debug!(
            "Posting {} bytes for {} recipient(s) to {}",
            request.body().len(),
            message.recipients.len(),
            request.uri()
        );

        let response = self.client.post(request).await?;

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|ra| ra.to_str().ok())
            .and_then(RetryAfter::from_str);

        let response_status = response.status();
        trace!("Response status: {}", response_status);

        let body = response.into_body();
        trace!("Body text: {:?}", std::str::from_utf8(&body));

        let response = request_builder::parse_response(response_status, body, message);

        debug!("Response: {:?}", response);

        match response {
            Err(GcmError::UnknownError {
                status,
                retry_after: None,
                body,
            }) if (500..600).contains(&status) => Err(GcmError::UnknownError {
                status,
                retry_after,
                body,
            }),
            response => response,
        }
    }
}
