//! # GCM Sender
//!
//! A client for the GCM/FCM legacy HTTP API. Sends a message to a device, a topic or up to
//! a thousand registration ids at once, and tells which registration ids must be replaced,
//! removed, or retried afterwards.
//!
//! This library is async and executor-agnostic with the default
//! [`isahc`](https://crates.io/crates/isahc) client. The `hyper-client` and
//! `hyper-rustls-client` features switch to [`hyper`](https://crates.io/crates/hyper) for
//! Tokio applications, and any other HTTP stack can be plugged in by implementing
//! [`GcmClient`].
//!
//! # Example
//!
//! ```no_run
//! # use gcm_sender::*;
//! # #[tokio::main]
//! # async fn main() -> Result<(), GcmError> {
//! let sender = GcmSender::new(SenderConfig::new("AIzaSy...server-key"))?;
//!
//! let mut builder = GcmMessageBuilder::new(vec!["registration-id-1", "registration-id-2"]);
//! builder.add_data("message", "Hello, world!");
//! builder.set_time_to_live(3600);
//!
//! let response = sender.send(&builder.build()).await?;
//!
//! for (old_id, new_id) in response.new_registration_ids() {
//!     println!("replace {} with {}", old_id, new_id);
//! }
//! for id in response.invalid_registration_ids() {
//!     println!("forget {}", id);
//! }
//! for id in response.unavailable_registration_ids() {
//!     println!("try {} again later", id);
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub use crate::clients::request_builder;
#[cfg(feature = "hyper-client")]
pub use crate::clients::hyper_client::HyperGcmClient;
#[cfg(feature = "hyper-rustls-client")]
pub use crate::clients::hyper_rustls_client::HyperRustlsGcmClient;
#[cfg(feature = "isahc-client")]
pub use crate::clients::isahc_client::IsahcGcmClient;
pub use crate::clients::GcmClient;
pub use crate::config::{SenderConfig, DEFAULT_ENDPOINT};
pub use crate::error::GcmError;
pub use crate::message::{GcmMessage, GcmMessageBuilder, Priority, Recipients};
pub use crate::notification::Notification;
pub use crate::response::{ErrorCode, GcmResponse, RecipientOutcome, RecipientResult};
pub use crate::sender::GcmSender;

mod clients;
mod config;
mod error;
mod message;
mod notification;
mod response;
mod sender;
