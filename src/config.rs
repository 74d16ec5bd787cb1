use std::fmt;
use std::path::PathBuf;

/// The legacy GCM HTTP send endpoint, used when no override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://android.googleapis.com/gcm/send";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Settings for a [`GcmSender`](crate::GcmSender). Read once, when the sender
/// and its client are constructed.
///
/// Can be deserialized, so it may live in the application's own config file:
///
/// ```
/// # use gcm_sender::SenderConfig;
/// let config: SenderConfig = serde_json::from_str(r#"{"api_key": "AIza..."}"#).unwrap();
/// assert_eq!(gcm_sender::DEFAULT_ENDPOINT, config.endpoint);
/// ```
#[derive(Clone, Deserialize)]
pub struct SenderConfig {
    /// An API key that gives the application server authorized access to the
    /// gateway. Sending without one fails with `IllegalApiKey`.
    pub api_key: Option<String>,
    /// Where to POST the messages.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// A PEM file with the CA certificate(s) to trust when verifying the
    /// gateway, instead of the system store.
    #[serde(default)]
    pub ca_info_path: Option<PathBuf>,
}

impl SenderConfig {
    pub fn new<S>(api_key: S) -> SenderConfig
    where
        S: Into<String>,
    {
        SenderConfig {
            api_key: Some(api_key.into()),
            ..SenderConfig::default()
        }
    }

    pub fn with_endpoint<S>(mut self, endpoint: S) -> SenderConfig
    where
        S: Into<String>,
    {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_ca_info_path<P>(mut self, path: P) -> SenderConfig
    where
        P: Into<PathBuf>,
    {
        self.ca_info_path = Some(path.into());
        self
    }

    /// The API key, if one is set and not blank.
    pub(crate) fn usable_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            api_key: None,
            endpoint: default_endpoint(),
            ca_info_path: None,
        }
    }
}

impl fmt::Debug for SenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("ca_info_path", &self.ca_info_path)
            .finish()
    }
}
