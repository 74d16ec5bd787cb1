use std::time::{Duration, SystemTime};
use std::{convert::From, error::Error, fmt, io::Error as IoError};

use http::uri::InvalidUri;
use serde_json::error::Error as JsonError;

#[derive(Debug)]
pub enum GcmError {
    /// No server API key was configured, or the key can't be sent as a header
    IllegalApiKey,
    /// The gateway rejected the API key (HTTP 401). Contains the response body.
    AuthenticationError(String),
    /// The request was refused locally before sending, or by the gateway with
    /// HTTP 400. Contains a description or the response body.
    MalformedRequest(String),
    /// Any other non-200 status. Contains an optional `Duration`, until the
    /// sender can retry the request, if the gateway gave one.
    UnknownError {
        status: u16,
        retry_after: Option<Duration>,
        body: String,
    },
    /// The response body was not valid JSON, or did not line up with the
    /// recipients of the request
    MalformedResponse(String),
    /// The configured endpoint is not a valid URI
    InvalidUri,
    /// The response body exceeded the client's size limit
    ResponseTooLarge,
    /// Error in reading a file or a response stream
    Io(IoError),
    /// The HTTP client failed to complete the exchange
    Transport(Box<dyn Error + Send + Sync>),
}

impl Error for GcmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GcmError::Io(err) => Some(err),
            GcmError::Transport(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<JsonError> for GcmError {
    fn from(err: JsonError) -> GcmError {
        GcmError::MalformedResponse(err.to_string())
    }
}

impl From<InvalidUri> for GcmError {
    fn from(_: InvalidUri) -> GcmError {
        GcmError::InvalidUri
    }
}

impl From<http::Error> for GcmError {
    fn from(err: http::Error) -> GcmError {
        GcmError::MalformedRequest(err.to_string())
    }
}

#[cfg(any(feature = "hyper-client", feature = "hyper-rustls-client"))]
impl From<hyper::Error> for GcmError {
    fn from(err: hyper::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[cfg(feature = "hyper-client")]
impl From<native_tls::Error> for GcmError {
    fn from(err: native_tls::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

#[cfg(feature = "isahc-client")]
impl From<isahc::Error> for GcmError {
    fn from(err: isahc::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<IoError> for GcmError {
    fn from(err: IoError) -> GcmError {
        GcmError::Io(err)
    }
}

impl GcmError {
    pub fn short_description(&self) -> &'static str {
        match *self {
            GcmError::IllegalApiKey => "illegal_api_key",
            GcmError::AuthenticationError(_) => "authentication_error",
            GcmError::MalformedRequest(_) => "malformed_request",
            GcmError::UnknownError { .. } => "unknown_error",
            GcmError::MalformedResponse(_) => "malformed_response",
            GcmError::InvalidUri => "invalid_uri",
            GcmError::ResponseTooLarge => "response_too_large",
            GcmError::Io(_) => "io_error",
            GcmError::Transport(_) => "transport_error",
        }
    }

    /// Stable numeric code for branching on the error kind.
    ///
    /// `1` illegal api key, `2` authentication error, `3` malformed request,
    /// `4` unknown error, `5` malformed response. An unusable endpoint counts as
    /// a malformed request and an oversized body as a malformed response. I/O
    /// and transport faults never reached a gateway verdict and return `0`.
    pub fn code(&self) -> u8 {
        match *self {
            GcmError::IllegalApiKey => 1,
            GcmError::AuthenticationError(_) => 2,
            GcmError::MalformedRequest(_) | GcmError::InvalidUri => 3,
            GcmError::UnknownError { .. } => 4,
            GcmError::MalformedResponse(_) | GcmError::ResponseTooLarge => 5,
            GcmError::Io(_) | GcmError::Transport(_) => 0,
        }
    }
}

impl fmt::Display for GcmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GcmError::IllegalApiKey => write!(f, "server api key not set"),
            GcmError::AuthenticationError(body) => write!(f, "authentication error: {}", body),
            GcmError::MalformedRequest(msg) => write!(f, "malformed request: {}", msg),
            GcmError::UnknownError { status, body, .. } => write!(f, "unknown error (status {}): {}", status, body),
            GcmError::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
            GcmError::InvalidUri => write!(f, "invalid uri provided"),
            GcmError::ResponseTooLarge => write!(f, "response from the gateway was too large"),
            GcmError::Io(err) => write!(f, "i/o error: {}", err),
            GcmError::Transport(err) => write!(f, "transport error: {}", err),
        }
    }
}

pub struct RetryAfter;
impl RetryAfter {
    pub fn from_str(header_value: &str) -> Option<Duration> {
        if let Ok(seconds) = header_value.parse::<u64>() {
            Some(Duration::from_secs(seconds))
        } else {
            chrono::DateTime::parse_from_rfc2822(header_value)
                .map(|date_time| {
                    let systime: SystemTime = date_time.into();

                    systime
                        .duration_since(SystemTime::now())
                        .unwrap_or_else(|_| Duration::new(0, 0))
                })
                .ok()
        }
    }
}
