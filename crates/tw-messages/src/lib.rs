//! tw-messages: message history client for tw-gateway
//!
//! Sends SMS, MMS and WhatsApp messages through the Twilio Messaging API and
//! reads message history back. Listing follows `next_page_uri` cursors to the
//! last page, and conversations merge both directions between two parties
//! into one send-time ordered list.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tw_core::TwilioConfig;
//! use tw_messages::{ConversationFilter, MessagesClient};
//!
//! let client = MessagesClient::new(TwilioConfig::load()?)?;
//!
//! let filter = ConversationFilter::new("+15550001", "+15550002")
//!     .created_after("2024-01-01");
//! for message in client.conversation(&filter).await? {
//!     println!("{} {} -> {}: {}", message.date_sent, message.from, message.to, message.body);
//! }
//! ```

pub mod client;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod filter;
pub mod pager;
pub mod timestamp;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::MessagesClient;
pub use conversation::{merge_legs, ConversationFilter, ConversationMerger};
pub use error::{ApiError, Error, Result};
pub use filter::{MessageFilter, PAGE_SIZE};
pub use pager::{resolve_cursor, unpack_page, PageWalker};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::{ApiException, MessagePage, MessageRecord, SendOptions, SubAccount, SubAccountRequest};

/// Re-export the common types for easy use
pub mod prelude {
    pub use super::{ConversationFilter, MessageFilter, MessageRecord, MessagesClient, SendOptions};
}
