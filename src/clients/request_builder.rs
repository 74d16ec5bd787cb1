//! Functions used to build the send request and consume the gateway's answer.
//! This module can be used to build custom clients.

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Request, StatusCode, Uri};
use serde_json::{Map, Value};

use crate::config::SenderConfig;
use crate::error::GcmError;
use crate::message::{GcmMessage, Priority, Recipients};
use crate::notification::Notification;
use crate::response::GcmResponse;

/// The gateway refuses multicast messages to more registration ids than this.
pub const MAX_RECIPIENTS: usize = 1000;
/// Maximum size of the serialized `data` payload, in bytes.
pub const MAX_DATA_SIZE: usize = 4096;
/// Maximum size of the serialized `notification` payload, in bytes.
pub const MAX_NOTIFICATION_SIZE: usize = 2048;

/// The JSON body of a send request.
#[derive(Debug, Serialize)]
struct GcmPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collapse_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay_while_idle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restricted_package_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
}

impl<'a> From<&'a GcmMessage> for GcmPayload<'a> {
    fn from(message: &'a GcmMessage) -> Self {
        let (to, registration_ids) = match &message.recipients {
            Recipients::Single(to) => (Some(to.as_str()), None),
            Recipients::Multiple(ids) => (None, Some(ids.as_slice())),
        };

        GcmPayload {
            to,
            registration_ids,
            collapse_key: message.collapse_key.as_deref(),
            data: message.data.as_ref(),
            notification: message.notification.as_ref(),
            delay_while_idle: message.delay_while_idle,
            time_to_live: message.time_to_live,
            restricted_package_name: message.restricted_package_name.as_deref(),
            dry_run: message.dry_run,
            content_available: message.content_available,
            priority: message.priority,
        }
    }
}

/// Checks the message against the gateway's limits. Runs before anything is
/// sent.
pub fn validate(message: &GcmMessage) -> Result<(), GcmError> {
    if message.recipients.len() > MAX_RECIPIENTS {
        return Err(GcmError::MalformedRequest(format!(
            "{} registration ids exceed the gateway limit of {}",
            message.recipients.len(),
            MAX_RECIPIENTS
        )));
    }

    if let Some(ref data) = message.data {
        check_payload_size("data", serde_json::to_vec(data), MAX_DATA_SIZE)?;
    }

    if let Some(ref notification) = message.notification {
        check_payload_size("notification", notification.to_payload(), MAX_NOTIFICATION_SIZE)?;
    }

    Ok(())
}

fn check_payload_size(field: &str, payload: serde_json::Result<Vec<u8>>, max_size: usize) -> Result<(), GcmError> {
    let size = payload
        .map_err(|e| GcmError::MalformedRequest(format!("{} payload: {}", field, e)))?
        .len();

    if size > max_size {
        return Err(GcmError::MalformedRequest(format!(
            "{} payload is too big ({} bytes, max {} bytes)",
            field, size, max_size
        )));
    }

    Ok(())
}

/// Builds the request to send to the gateway.
///
/// Fails with `IllegalApiKey` without a usable API key, and with
/// `MalformedRequest` when the message breaks a gateway limit.
///
/// This function is generic over the request body, this means that you can swap out client implementations
/// even if they use different body types.
///
/// # Example
///
/// ```
/// # use gcm_sender::{GcmMessageBuilder, SenderConfig};
/// # use gcm_sender::request_builder::build_request;
/// let config = SenderConfig::new("AIzaSyExampleKey");
///
/// let mut builder = GcmMessageBuilder::new(vec!["token-1", "token-2"]);
/// builder.add_data("score", "4x8");
///
/// let request = build_request::<Vec<u8>>(&config, &builder.build()).unwrap();
/// assert_eq!(request.headers()["Authorization"], "key=AIzaSyExampleKey");
/// ```
pub fn build_request<T>(config: &SenderConfig, message: &GcmMessage) -> Result<Request<T>, GcmError>
where
    T: From<Vec<u8>>,
{
    let api_key = config.usable_api_key().ok_or(GcmError::IllegalApiKey)?;

    validate(message)?;

    let uri: Uri = config.endpoint.parse()?;
    let authorization = HeaderValue::from_str(&format!("key={}", api_key)).map_err(|_| GcmError::IllegalApiKey)?;

    let body = serde_json::to_vec(&GcmPayload::from(message))
        .map_err(|e| GcmError::MalformedRequest(e.to_string()))?;

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(AUTHORIZATION, authorization)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, format!("{}", body.len() as u64).as_bytes())
        .body(body.into())?;

    Ok(request)
}

/// Parses the response from the gateway for `message`, and will return `Err` if the request was refused.
pub fn parse_response(response_status: StatusCode, body: Vec<u8>, message: &GcmMessage) -> Result<GcmResponse, GcmError> {
    match response_status {
        StatusCode::OK => GcmResponse::parse(&body, message),
        StatusCode::BAD_REQUEST => Err(GcmError::MalformedRequest(body_text(body))),
        StatusCode::UNAUTHORIZED => Err(GcmError::AuthenticationError(body_text(body))),
        status => Err(GcmError::UnknownError {
            status: status.as_u16(),
            retry_after: None,
            body: body_text(body),
        }),
    }
}

fn body_text(body: Vec<u8>) -> String {
    String::from_utf8_lossy(&body).into_owned()
}
