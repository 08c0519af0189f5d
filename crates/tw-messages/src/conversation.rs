//! Two-way conversation assembly
//!
//! A conversation between A and B is the union of two independent list
//! queries ("legs"): messages to B from A and messages to A from B. Each leg
//! is walked to completion on its own, then both are merged by send time.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::Result;
use crate::filter::MessageFilter;
use crate::pager::PageWalker;
use crate::types::MessageRecord;

/// The two endpoints of a conversation plus optional creation-date bounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationFilter {
    pub party_a: String,
    pub party_b: String,
    pub date_created_on_or_before: Option<String>,
    pub date_created_after: Option<String>,
}

impl ConversationFilter {
    pub fn new(party_a: impl Into<String>, party_b: impl Into<String>) -> Self {
        Self {
            party_a: party_a.into(),
            party_b: party_b.into(),
            ..Default::default()
        }
    }

    pub fn created_on_or_before(mut self, date: impl Into<String>) -> Self {
        self.date_created_on_or_before = Some(date.into());
        self
    }

    pub fn created_after(mut self, date: impl Into<String>) -> Self {
        self.date_created_after = Some(date.into());
        self
    }

    /// `(to B from A, to A from B)`, both carrying the same date bounds
    pub fn legs(&self) -> (MessageFilter, MessageFilter) {
        let leg = |to: &str, from: &str| MessageFilter {
            to: Some(to.to_string()),
            from: Some(from.to_string()),
            date_created_on_or_before: self.date_created_on_or_before.clone(),
            date_created_after: self.date_created_after.clone(),
        };

        (
            leg(&self.party_b, &self.party_a),
            leg(&self.party_a, &self.party_b),
        )
    }
}

/// Concatenate two legs and order them by send time.
///
/// The sort is stable: records with equal send times, including every
/// record whose send time is missing or malformed (those sort as the Unix
/// epoch, i.e. first), keep their order from `first ++ second`.
pub fn merge_legs(first: Vec<MessageRecord>, second: Vec<MessageRecord>) -> Vec<MessageRecord> {
    let mut merged = first;
    merged.extend(second);
    merged.sort_by_cached_key(|m| m.date_sent_at().timestamp());
    merged
}

/// Builds conversations by walking both legs and merging them
#[derive(Clone)]
pub struct ConversationMerger {
    walker: PageWalker,
    api_base: String,
    account_sid: String,
    concurrent_legs: bool,
}

impl ConversationMerger {
    pub fn new(walker: PageWalker, api_base: impl Into<String>, account_sid: impl Into<String>) -> Self {
        Self {
            walker,
            api_base: api_base.into(),
            account_sid: account_sid.into(),
            concurrent_legs: false,
        }
    }

    /// Walk both legs at the same time instead of one after the other.
    /// The result is the same either way.
    pub fn with_concurrent_legs(mut self, enabled: bool) -> Self {
        self.concurrent_legs = enabled;
        self
    }

    /// Walker used for each leg
    pub fn walker(&self) -> &PageWalker {
        &self.walker
    }

    /// Every message between the two parties, oldest first
    pub async fn conversation(&self, filter: &ConversationFilter) -> Result<Vec<MessageRecord>> {
        self.conversation_until_cancelled(filter, &CancellationToken::new())
            .await
    }

    /// Like [`conversation`](Self::conversation), abandoning both legs with
    /// `Error::Cancelled` once `cancel` fires
    pub async fn conversation_until_cancelled(
        &self,
        filter: &ConversationFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageRecord>> {
        let (first_leg, second_leg) = filter.legs();
        let first_url = first_leg.list_url(&self.api_base, &self.account_sid)?;
        let second_url = second_leg.list_url(&self.api_base, &self.account_sid)?;

        let (first, second) = if self.concurrent_legs {
            tokio::try_join!(
                self.walker.walk_until_cancelled(first_url.as_str(), cancel),
                self.walker.walk_until_cancelled(second_url.as_str(), cancel),
            )?
        } else {
            let first = self
                .walker
                .walk_until_cancelled(first_url.as_str(), cancel)
                .await?;
            let second = self
                .walker
                .walk_until_cancelled(second_url.as_str(), cancel)
                .await?;
            (first, second)
        };

        let (a_to_b, b_to_a) = (first.len(), second.len());
        let merged = merge_legs(first, second);

        info!(
            party_a = %filter.party_a,
            party_b = %filter.party_b,
            a_to_b,
            b_to_a,
            "Assembled conversation of {} messages",
            merged.len()
        );
        Ok(merged)
    }
}
