use serde_json::{Map, Value};

/// Display notification shown by the device on the application's behalf.
///
/// Every field is optional; only the set ones are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Icon color in `#rrggbb` format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_loc_args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<Vec<String>>,

    /// Keys the typed fields don't cover (`android_channel_id`, ...), sent
    /// alongside them and counted in the payload size.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    pub fn new<S>(title: S, body: S) -> Self
    where
        S: Into<String>,
    {
        Notification {
            title: Some(title.into()),
            body: Some(body.into()),
            ..Notification::default()
        }
    }

    /// The JSON bytes as they will appear in the request body.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
