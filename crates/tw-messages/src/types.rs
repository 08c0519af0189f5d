//! Message, page and error resource types

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::timestamp;

/// Deserialize `null` as an empty string. The API sends `null` for dates
/// and counts that are not known yet (e.g. `date_sent` while queued).
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A sent or received message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Message SID (`SM...` or `MM...`)
    #[serde(default)]
    pub sid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_created: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_updated: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_sent: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub account_sid: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub to: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub from: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub num_media: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub num_segments: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    /// `inbound`, `outbound-api`, `outbound-call` or `outbound-reply`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub direction: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub api_version: String,
    #[serde(default)]
    pub price: Option<String>,
    /// Resource path of this message, relative to the API host
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uri: String,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl MessageRecord {
    /// Creation time
    pub fn date_created_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        timestamp::parse(&self.date_created)
    }

    /// Last update time
    pub fn date_updated_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        timestamp::parse(&self.date_updated)
    }

    /// Send time. Missing or malformed values become the Unix epoch so
    /// ordering never fails.
    pub fn date_sent_at(&self) -> DateTime<FixedOffset> {
        timestamp::parse_or_epoch(&self.date_sent)
    }

    /// Whether the message carries media. An unknown count means none.
    pub fn is_mms(&self) -> bool {
        !self.num_media.is_empty() && self.num_media != "0"
    }

    /// Number of segments the body was split into
    pub fn segments(&self) -> u32 {
        if self.num_segments.is_empty() || self.num_segments == "1" {
            return 1;
        }

        match self.num_segments.parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(
                    sid = %self.sid,
                    num_segments = %self.num_segments,
                    "Unparseable segment count, assuming 1"
                );
                1
            }
        }
    }

    /// Whether the message was received by the account
    pub fn is_inbound(&self) -> bool {
        self.direction.contains("inbound")
    }
}

/// One page of a message list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    /// Host-relative path of the next page; absent or empty on the last page
    #[serde(default)]
    pub next_page_uri: Option<String>,
    #[serde(default)]
    pub previous_page_uri: Option<String>,
    #[serde(default)]
    pub first_page_uri: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Error body returned with a non-success status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiException {
    #[serde(default)]
    pub status: u16,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub more_info: String,
}

/// Sub-account creation parameters
#[derive(Debug, Clone, Default)]
pub struct SubAccountRequest {
    /// Human readable name; omitted from the request when empty
    pub friendly_name: String,
}

/// Sub-account resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubAccount {
    #[serde(default)]
    pub sid: String,
    #[serde(default, alias = "FriendlyName", deserialize_with = "null_as_empty")]
    pub friendly_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub auth_token: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

/// Optional parameters shared by every send operation
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// URL the API calls back with delivery status updates
    pub status_callback: Option<String>,
    /// Application whose status callback should be used
    pub application_sid: Option<String>,
}

impl SendOptions {
    pub fn with_status_callback(mut self, url: impl Into<String>) -> Self {
        self.status_callback = Some(url.into());
        self
    }

    pub fn with_application_sid(mut self, sid: impl Into<String>) -> Self {
        self.application_sid = Some(sid.into());
        self
    }
}
