//! Messaging API client
//!
//! Thin request/response wrappers for sending and fetching single messages,
//! plus entry points to the page walker and conversation merger.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use url::form_urlencoded;

use tw_core::TwilioConfig;

use crate::conversation::{ConversationFilter, ConversationMerger};
use crate::decode::{decode_response, STATUS_CREATED, STATUS_OK};
use crate::error::Result;
use crate::filter::MessageFilter;
use crate::pager::PageWalker;
use crate::transport::{HttpTransport, Transport};
use crate::types::{MessageRecord, SendOptions, SubAccount, SubAccountRequest};

/// Messaging API client bound to one account
#[derive(Clone)]
pub struct MessagesClient {
    transport: Arc<dyn Transport>,
    config: TwilioConfig,
    merger: ConversationMerger,
}

impl MessagesClient {
    /// Create a client using the `reqwest` transport
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client over any transport
    pub fn with_transport(config: TwilioConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let walker = PageWalker::new(transport.clone(), &config)?;
        let merger = ConversationMerger::new(walker, config.api_base(), &config.account_sid)
            .with_concurrent_legs(config.concurrent_legs);

        info!("Messages client initialized for account {}", config.account_sid);

        Ok(Self {
            transport,
            config,
            merger,
        })
    }

    pub fn config(&self) -> &TwilioConfig {
        &self.config
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/Accounts/{}/{}",
            self.config.api_base(),
            self.config.account_sid,
            resource
        )
    }

    /// Send an SMS
    pub async fn send_sms(
        &self,
        from: &str,
        to: &str,
        body: &str,
        options: &SendOptions,
    ) -> Result<MessageRecord> {
        let form = message_form(to, body, &[], options, ("From", from));
        self.send_message(form).await
    }

    /// Send a WhatsApp message. Both numbers are given without the
    /// `whatsapp:` prefix.
    pub async fn send_whatsapp(
        &self,
        from: &str,
        to: &str,
        body: &str,
        options: &SendOptions,
    ) -> Result<MessageRecord> {
        self.send_sms(&whatsapp(from), &whatsapp(to), body, options)
            .await
    }

    /// Send an SMS through a messaging service, which picks the sender
    pub async fn send_sms_with_copilot(
        &self,
        messaging_service_sid: &str,
        to: &str,
        body: &str,
        options: &SendOptions,
    ) -> Result<MessageRecord> {
        let form = message_form(
            to,
            body,
            &[],
            options,
            ("MessagingServiceSid", messaging_service_sid),
        );
        self.send_message(form).await
    }

    /// Send an MMS with one `MediaUrl` per entry in `media_urls`
    pub async fn send_mms(
        &self,
        from: &str,
        to: &str,
        body: &str,
        media_urls: &[String],
        options: &SendOptions,
    ) -> Result<MessageRecord> {
        let form = message_form(to, body, media_urls, options, ("From", from));
        self.send_message(form).await
    }

    async fn send_message(&self, form: String) -> Result<MessageRecord> {
        let url = self.account_url("Messages.json");
        let response = self.transport.post(&url, form).await?;
        let message: MessageRecord = decode_response(&response, STATUS_CREATED)?;

        info!(sid = %message.sid, status = %message.status, "Message queued to {}", message.to);
        Ok(message)
    }

    /// Fetch one message
    pub async fn get_message(&self, sid: &str) -> Result<MessageRecord> {
        let url = self.account_url(&format!("Messages/{}.json", sid));
        let response = self.transport.get(&url).await?;
        decode_response(&response, STATUS_OK)
    }

    /// Fetch one message through the legacy `SMS/Messages` resource
    pub async fn get_sms(&self, sid: &str) -> Result<MessageRecord> {
        let url = self.account_url(&format!("SMS/Messages/{}.json", sid));
        let response = self.transport.get(&url).await?;
        decode_response(&response, STATUS_OK)
    }

    /// Every message matching `filter`, across all pages
    pub async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<MessageRecord>> {
        let url = filter.list_url(&self.config.api_base(), &self.config.account_sid)?;
        self.merger.walker().walk(url.as_str()).await
    }

    /// Every message between the two parties of `filter`, oldest first
    pub async fn conversation(&self, filter: &ConversationFilter) -> Result<Vec<MessageRecord>> {
        self.merger.conversation(filter).await
    }

    /// Like [`conversation`](Self::conversation), cancellable
    pub async fn conversation_until_cancelled(
        &self,
        filter: &ConversationFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageRecord>> {
        self.merger
            .conversation_until_cancelled(filter, cancel)
            .await
    }

    /// Create a sub-account under this account
    pub async fn create_subaccount(&self, request: &SubAccountRequest) -> Result<SubAccount> {
        let url = format!("{}/Accounts.json", self.config.api_base());

        let mut form = form_urlencoded::Serializer::new(String::new());
        if !request.friendly_name.is_empty() {
            form.append_pair("FriendlyName", &request.friendly_name);
        }

        let response = self.transport.post(&url, form.finish()).await?;
        let account: SubAccount = decode_response(&response, STATUS_CREATED)?;

        info!(sid = %account.sid, "Created sub-account {}", account.friendly_name);
        Ok(account)
    }
}

fn whatsapp(number: &str) -> String {
    format!("whatsapp:{}", number)
}

/// Encode a send request. `sender` is `("From", number)` or
/// `("MessagingServiceSid", sid)`.
fn message_form(
    to: &str,
    body: &str,
    media_urls: &[String],
    options: &SendOptions,
    sender: (&str, &str),
) -> String {
    let mut form = form_urlencoded::Serializer::new(String::new());
    form.append_pair("To", to);
    form.append_pair("Body", body);

    for media_url in media_urls {
        form.append_pair("MediaUrl", media_url);
    }

    if let Some(callback) = options.status_callback.as_deref().filter(|s| !s.is_empty()) {
        form.append_pair("StatusCallback", callback);
    }
    if let Some(app) = options.application_sid.as_deref().filter(|s| !s.is_empty()) {
        form.append_pair("ApplicationSid", app);
    }

    form.append_pair(sender.0, sender.1);
    form.finish()
}
