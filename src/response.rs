//! Reading the gateway's answer to a successful (HTTP 200) send.
//!
//! The raw body comes in several shapes: a multicast envelope whose `results`
//! array lines up with the `registration_ids` of the request, a single-target or
//! topic answer, or a whole-request `error`. [`GcmResponse::parse`] folds all of
//! them into one typed value, keyed by the registration ids that were sent.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::GcmError;
use crate::message::{GcmMessage, Recipients};

/// Error strings the gateway reports per recipient, or for the whole request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    MissingRegistration,
    InvalidRegistration,
    NotRegistered,
    InvalidPackageName,
    MismatchSenderId,
    InvalidParameters,
    MessageTooBig,
    InvalidDataKey,
    InvalidTtl,
    Unavailable,
    InternalServerError,
    DeviceMessageRateExceeded,
    TopicsMessageRateExceeded,
    InvalidApnsCredential,
    Other(String),
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "MissingRegistration" => ErrorCode::MissingRegistration,
            "InvalidRegistration" => ErrorCode::InvalidRegistration,
            "NotRegistered" => ErrorCode::NotRegistered,
            "InvalidPackageName" => ErrorCode::InvalidPackageName,
            "MismatchSenderId" => ErrorCode::MismatchSenderId,
            "InvalidParameters" => ErrorCode::InvalidParameters,
            "MessageTooBig" => ErrorCode::MessageTooBig,
            "InvalidDataKey" => ErrorCode::InvalidDataKey,
            "InvalidTtl" => ErrorCode::InvalidTtl,
            "Unavailable" => ErrorCode::Unavailable,
            "InternalServerError" => ErrorCode::InternalServerError,
            "DeviceMessageRateExceeded" => ErrorCode::DeviceMessageRateExceeded,
            "TopicsMessageRateExceeded" => ErrorCode::TopicsMessageRateExceeded,
            "InvalidApnsCredential" => ErrorCode::InvalidApnsCredential,
            _ => ErrorCode::Other(code),
        }
    }
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::MissingRegistration => "MissingRegistration",
            ErrorCode::InvalidRegistration => "InvalidRegistration",
            ErrorCode::NotRegistered => "NotRegistered",
            ErrorCode::InvalidPackageName => "InvalidPackageName",
            ErrorCode::MismatchSenderId => "MismatchSenderId",
            ErrorCode::InvalidParameters => "InvalidParameters",
            ErrorCode::MessageTooBig => "MessageTooBig",
            ErrorCode::InvalidDataKey => "InvalidDataKey",
            ErrorCode::InvalidTtl => "InvalidTtl",
            ErrorCode::Unavailable => "Unavailable",
            ErrorCode::InternalServerError => "InternalServerError",
            ErrorCode::DeviceMessageRateExceeded => "DeviceMessageRateExceeded",
            ErrorCode::TopicsMessageRateExceeded => "TopicsMessageRateExceeded",
            ErrorCode::InvalidApnsCredential => "InvalidApnsCredential",
            ErrorCode::Other(code) => code,
        }
    }

    /// The registration token is gone for good and should be dropped.
    pub fn is_invalid_registration(&self) -> bool {
        matches!(self, ErrorCode::NotRegistered | ErrorCode::InvalidRegistration)
    }

    /// The gateway was busy; sending again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::Unavailable | ErrorCode::InternalServerError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the message for one recipient.
///
/// The gateway is not always complete: a record may lack its `message_id`, or
/// carry nothing at all, which counts as delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientOutcome {
    Delivered {
        message_id: Option<String>,
    },
    /// Delivered, but the device has a newer registration id which must
    /// replace the one used in the request.
    Replaced {
        message_id: Option<String>,
        registration_id: String,
    },
    Failed {
        error: ErrorCode,
    },
}

/// A recipient of the request paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientResult {
    /// The registration id (or topic) as it was sent.
    pub registration_id: String,
    pub outcome: RecipientOutcome,
}

/// The gateway answer, aligned with the recipients of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct GcmResponse {
    multicast_id: Option<i64>,
    message_id: Option<String>,
    success: u64,
    failure: u64,
    canonical_ids: u64,
    error: Option<ErrorCode>,
    results: Vec<RecipientResult>,
}

/// Numbers from the gateway are not always numbers: message ids come as
/// strings inside `results`, but as integers for topic sends.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct RawResult {
    message_id: Option<RawId>,
    registration_id: Option<String>,
    error: Option<String>,
}

impl RawResult {
    fn into_outcome(self) -> RecipientOutcome {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return RecipientOutcome::Failed {
                error: ErrorCode::from(error),
            };
        }

        let message_id = self.message_id.map(String::from);

        match self.registration_id {
            Some(registration_id) => RecipientOutcome::Replaced {
                message_id,
                registration_id,
            },
            None => RecipientOutcome::Delivered { message_id },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResults {
    Many(Vec<RawResult>),
    One(RawResult),
}

#[derive(Deserialize)]
struct RawResponse {
    multicast_id: Option<i64>,
    message_id: Option<RawId>,
    success: Option<u64>,
    failure: Option<u64>,
    canonical_ids: Option<u64>,
    results: Option<RawResults>,
    error: Option<Value>,
}

/// The whole-request error, unless the value is falsy (`null`, `false`, `0`,
/// `""`, `[]`, `{}`).
fn request_error(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

impl GcmResponse {
    /// Parses a response body received for `message`.
    ///
    /// Fails with `MalformedResponse` if the body is not JSON, or if its
    /// `results` don't pair up one-to-one with the recipients.
    pub fn parse(body: &[u8], message: &GcmMessage) -> Result<GcmResponse, GcmError> {
        let raw: RawResponse = serde_json::from_slice(body).map_err(|e| {
            GcmError::MalformedResponse(format!("{}. {}", e, String::from_utf8_lossy(body)))
        })?;

        let message_id = raw.message_id.map(String::from);

        if let Some(error) = request_error(raw.error) {
            trace!("Whole request failed: {}", error);

            return Ok(GcmResponse {
                multicast_id: None,
                message_id,
                success: 0,
                failure: raw.failure.unwrap_or(1),
                canonical_ids: 0,
                error: Some(ErrorCode::from(error)),
                results: Vec::new(),
            });
        }

        // Single and topic sends carry no multicast envelope and leave out
        // `success`.
        let success = match raw.multicast_id {
            None => 1,
            Some(_) => raw.success.unwrap_or(0),
        };

        Ok(GcmResponse {
            multicast_id: raw.multicast_id,
            message_id,
            success,
            failure: raw.failure.unwrap_or(0),
            canonical_ids: raw.canonical_ids.unwrap_or(0),
            error: None,
            results: align_results(&message.recipients, raw.results)?,
        })
    }

    pub fn multicast_id(&self) -> Option<i64> {
        self.multicast_id
    }

    /// Only set for single-recipient or topic sends.
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn success_count(&self) -> u64 {
        self.success
    }

    pub fn failure_count(&self) -> u64 {
        self.failure
    }

    /// Number of results that contain a canonical registration id.
    pub fn new_registration_ids_count(&self) -> u64 {
        self.canonical_ids
    }

    /// Set when the whole request failed. No per-recipient results exist then.
    pub fn error(&self) -> Option<&ErrorCode> {
        self.error.as_ref()
    }

    /// All outcomes, in the order the recipients were sent.
    pub fn results(&self) -> &[RecipientResult] {
        &self.results
    }

    pub fn outcome_for(&self, registration_id: &str) -> Option<&RecipientOutcome> {
        self.results
            .iter()
            .find(|r| r.registration_id == registration_id)
            .map(|r| &r.outcome)
    }

    /// True when nothing failed, neither the request nor any recipient.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failure == 0
    }

    /// Old registration ids mapped to the new ones that must replace them in
    /// storage.
    pub fn new_registration_ids(&self) -> BTreeMap<&str, &str> {
        if self.canonical_ids == 0 {
            return BTreeMap::new();
        }

        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                RecipientOutcome::Replaced { registration_id, .. } => {
                    Some((r.registration_id.as_str(), registration_id.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    /// Registration ids of uninstalled or never valid registrations. They
    /// should be removed from storage.
    pub fn invalid_registration_ids(&self) -> Vec<&str> {
        self.failed_ids(ErrorCode::is_invalid_registration)
    }

    /// Registration ids the message should be sent to again later, as the
    /// gateway could not process them right now.
    pub fn unavailable_registration_ids(&self) -> Vec<&str> {
        self.failed_ids(|error| *error == ErrorCode::Unavailable)
    }

    fn failed_ids<F>(&self, predicate: F) -> Vec<&str>
    where
        F: Fn(&ErrorCode) -> bool,
    {
        if self.failure == 0 {
            return Vec::new();
        }

        self.results
            .iter()
            .filter(|r| matches!(&r.outcome, RecipientOutcome::Failed { error } if predicate(error)))
            .map(|r| r.registration_id.as_str())
            .collect()
    }
}

/// Pairs result `i` with recipient `i`.
fn align_results(recipients: &Recipients, results: Option<RawResults>) -> Result<Vec<RecipientResult>, GcmError> {
    match recipients {
        Recipients::Multiple(ids) => {
            let results = match results {
                Some(RawResults::Many(results)) => results,
                Some(RawResults::One(result)) => vec![result],
                None if ids.is_empty() => Vec::new(),
                None => return Err(GcmError::MalformedResponse("results missing from multicast response".into())),
            };

            if results.len() != ids.len() {
                return Err(GcmError::MalformedResponse(format!(
                    "got {} results for {} registration ids",
                    results.len(),
                    ids.len()
                )));
            }

            Ok(ids
                .iter()
                .zip(results)
                .map(|(id, result)| RecipientResult {
                    registration_id: id.clone(),
                    outcome: result.into_outcome(),
                })
                .collect())
        }
        Recipients::Single(id) => {
            let result = match results {
                Some(RawResults::One(result)) => Some(result),
                Some(RawResults::Many(mut results)) if results.len() <= 1 => results.pop(),
                Some(RawResults::Many(results)) => {
                    return Err(GcmError::MalformedResponse(format!(
                        "got {} results for a single recipient",
                        results.len()
                    )))
                }
                None => None,
            };

            Ok(result
                .map(|result| RecipientResult {
                    registration_id: id.clone(),
                    outcome: result.into_outcome(),
                })
                .into_iter()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::error::GcmError;
    use crate::message::{GcmMessage, GcmMessageBuilder, Recipients};
    use crate::response::*;

    const MULTICAST_RESPONSE: &str = r#"
        {
            "multicast_id": 216,
            "success": 3,
            "failure": 3,
            "canonical_ids": 1,
            "results": [
                { "message_id": "1:0408" },
                { "error": "Unavailable" },
                { "error": "InvalidRegistration" },
                { "message_id": "1:1516" },
                { "message_id": "1:2342", "registration_id": "32" },
                { "error": "NotRegistered" }
            ],
            "error": null
        }
    "#;

    fn message_to<R: Into<Recipients>>(recipients: R) -> GcmMessage {
        GcmMessageBuilder::new(recipients).build()
    }

    fn six_recipients() -> GcmMessage {
        message_to(vec!["1", "2", "3", "4", "5", "6"])
    }

    #[test]
    fn finds_new_registration_ids() {
        let response = GcmResponse::parse(MULTICAST_RESPONSE.as_bytes(), &six_recipients()).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("5", "32");

        assert_eq!(expected, response.new_registration_ids());
    }

    #[test]
    fn finds_invalid_registration_ids() {
        let response = GcmResponse::parse(MULTICAST_RESPONSE.as_bytes(), &six_recipients()).unwrap();

        assert_eq!(vec!["3", "6"], response.invalid_registration_ids());
    }

    #[test]
    fn finds_unavailable_registration_ids() {
        let response = GcmResponse::parse(MULTICAST_RESPONSE.as_bytes(), &six_recipients()).unwrap();

        assert_eq!(vec!["2"], response.unavailable_registration_ids());
    }

    #[test]
    fn reads_the_multicast_envelope() {
        let response = GcmResponse::parse(MULTICAST_RESPONSE.as_bytes(), &six_recipients()).unwrap();

        assert_eq!(Some(216), response.multicast_id());
        assert_eq!(None, response.message_id());
        assert_eq!(3, response.success_count());
        assert_eq!(3, response.failure_count());
        assert_eq!(1, response.new_registration_ids_count());
        assert_eq!(None, response.error());
        assert!(!response.is_success());
        assert_eq!(6, response.results().len());
        assert_eq!(
            Some(&RecipientOutcome::Delivered {
                message_id: Some("1:1516".into())
            }),
            response.outcome_for("4")
        );
        assert_eq!(
            Some(&RecipientOutcome::Replaced {
                message_id: Some("1:2342".into()),
                registration_id: "32".into()
            }),
            response.outcome_for("5")
        );
    }

    #[test]
    fn zero_canonical_ids_short_circuits_new_registration_ids() {
        let body = r#"
        {
            "multicast_id": 1,
            "success": 1,
            "failure": 0,
            "canonical_ids": 0,
            "results": [{ "message_id": "1:2342", "registration_id": "32" }]
        }
        "#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["5"])).unwrap();

        assert!(response.new_registration_ids().is_empty());
    }

    #[test]
    fn zero_failures_short_circuits_failed_ids() {
        let body = r#"
        {
            "multicast_id": 1,
            "success": 1,
            "failure": 0,
            "canonical_ids": 0,
            "results": [{ "error": "NotRegistered" }, { "error": "Unavailable" }]
        }
        "#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["1", "2"])).unwrap();

        assert!(response.invalid_registration_ids().is_empty());
        assert!(response.unavailable_registration_ids().is_empty());
    }

    #[test]
    fn whole_request_error_has_no_results() {
        let body = r#"{ "error": "TopicsMessageRateExceeded" }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(Recipients::topic("news"))).unwrap();

        assert_eq!(Some(&ErrorCode::TopicsMessageRateExceeded), response.error());
        assert_eq!(1, response.failure_count());
        assert_eq!(0, response.success_count());
        assert!(response.results().is_empty());
        assert!(response.invalid_registration_ids().is_empty());
    }

    #[test]
    fn whole_request_error_keeps_given_failure_count_and_message_id() {
        let body = r#"{ "error": "InvalidParameters", "failure": 4, "message_id": 77,
                        "results": [{ "error": "NotRegistered" }] }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a"])).unwrap();

        assert_eq!(4, response.failure_count());
        assert_eq!(Some("77"), response.message_id());
        assert!(response.results().is_empty());
    }

    #[test]
    fn topic_send_counts_as_one_success() {
        let body = r#"{ "message_id": 6177433633397011933 }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(Recipients::topic("news"))).unwrap();

        assert_eq!(Some("6177433633397011933"), response.message_id());
        assert_eq!(None, response.multicast_id());
        assert_eq!(1, response.success_count());
        assert_eq!(0, response.failure_count());
        assert!(response.results().is_empty());
        assert!(response.is_success());
    }

    #[test]
    fn single_recipient_maps_an_object_result() {
        let body = r#"{ "results": { "error": "NotRegistered" }, "failure": 1 }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to("token")).unwrap();

        assert_eq!(vec!["token"], response.invalid_registration_ids());
    }

    #[test]
    fn single_recipient_maps_a_one_element_array() {
        let body = r#"
        {
            "multicast_id": 9,
            "success": 1,
            "failure": 0,
            "canonical_ids": 1,
            "results": [{ "message_id": "0:1", "registration_id": "new-token" }]
        }
        "#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to("old-token")).unwrap();

        assert_eq!(Some(&"new-token"), response.new_registration_ids().get("old-token"));
    }

    #[test]
    fn single_recipient_rejects_several_results() {
        let body = r#"{ "multicast_id": 9, "results": [{ "message_id": "0:1" }, { "message_id": "0:2" }] }"#;

        assert!(matches!(
            GcmResponse::parse(body.as_bytes(), &message_to("token")),
            Err(GcmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_fewer_results_than_recipients() {
        let body = r#"{ "multicast_id": 1, "success": 1, "failure": 0, "results": [{ "message_id": "1:1" }] }"#;

        assert!(matches!(
            GcmResponse::parse(body.as_bytes(), &message_to(vec!["a", "b"])),
            Err(GcmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_missing_results_for_multicast() {
        let body = r#"{ "multicast_id": 1, "success": 2, "failure": 0 }"#;

        assert!(matches!(
            GcmResponse::parse(body.as_bytes(), &message_to(vec!["a", "b"])),
            Err(GcmError::MalformedResponse(_))
        ));
    }

    #[test]
    fn incomplete_records_do_not_hide_the_others() {
        let body = r#"
        {
            "multicast_id": 1,
            "success": 1,
            "failure": 2,
            "canonical_ids": 1,
            "results": [
                { "registration_id": "new" },
                { "error": "NotRegistered" },
                { "error": "Unavailable" }
            ]
        }
        "#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a", "b", "c"])).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("a", "new");

        assert_eq!(expected, response.new_registration_ids());
        assert_eq!(vec!["b"], response.invalid_registration_ids());
        assert_eq!(vec!["c"], response.unavailable_registration_ids());
    }

    #[test]
    fn empty_records_count_as_delivered() {
        let body = r#"{ "multicast_id": 1, "success": 1, "failure": 1, "results": [{}, { "error": "NotRegistered" }] }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a", "b"])).unwrap();

        assert_eq!(Some(&RecipientOutcome::Delivered { message_id: None }), response.outcome_for("a"));
        assert_eq!(vec!["b"], response.invalid_registration_ids());
    }

    #[test]
    fn falsy_request_errors_take_the_success_branch() {
        for error in ["null", "false", "0", "\"\""] {
            let body = format!(
                r#"{{ "multicast_id": 1, "success": 1, "failure": 0, "error": {}, "results": [{{ "message_id": "1" }}] }}"#,
                error
            );
            let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a"])).unwrap();

            assert_eq!(None, response.error(), "error: {}", error);
            assert_eq!(1, response.success_count());
            assert_eq!(1, response.results().len());
        }
    }

    #[test]
    fn absent_request_error_takes_the_success_branch() {
        let body = r#"{ "multicast_id": 1, "success": 1, "failure": 0, "results": [{ "message_id": "1" }] }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a"])).unwrap();

        assert_eq!(None, response.error());
        assert!(response.is_success());
    }

    #[test]
    fn rejects_a_body_that_is_not_json() {
        let result = GcmResponse::parse(b"<html>oops</html>", &six_recipients());

        match result {
            Err(GcmError::MalformedResponse(msg)) => assert!(msg.contains("<html>oops</html>")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_error_codes_are_kept() {
        let body = r#"{ "multicast_id": 1, "failure": 1, "results": [{ "error": "SomethingNew" }] }"#;
        let response = GcmResponse::parse(body.as_bytes(), &message_to(vec!["a"])).unwrap();

        assert_eq!(
            Some(&RecipientOutcome::Failed {
                error: ErrorCode::Other("SomethingNew".into())
            }),
            response.outcome_for("a")
        );
        assert!(response.invalid_registration_ids().is_empty());
    }

    #[test]
    fn error_codes_round_trip_through_strings() {
        for code in ["NotRegistered", "Unavailable", "MismatchSenderId", "Whatever"] {
            assert_eq!(code, ErrorCode::from(code.to_string()).as_str());
        }
        assert!(ErrorCode::InternalServerError.is_retryable());
        assert!(!ErrorCode::NotRegistered.is_retryable());
    }
}
