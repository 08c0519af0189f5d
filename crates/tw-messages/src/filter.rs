//! Message list filters and query URL construction

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Page size requested from the list endpoint. Advisory: the server may
/// return fewer records per page, and the walker does not rely on it.
pub const PAGE_SIZE: u32 = 1000;

/// Filter for one message list query. Empty fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    pub to: Option<String>,
    pub from: Option<String>,
    /// `YYYY-MM-DD`, inclusive upper bound on creation date
    pub date_created_on_or_before: Option<String>,
    /// `YYYY-MM-DD`, exclusive lower bound on creation date
    pub date_created_after: Option<String>,
}

impl MessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn created_on_or_before(mut self, date: impl Into<String>) -> Self {
        self.date_created_on_or_before = Some(date.into());
        self
    }

    pub fn created_after(mut self, date: impl Into<String>) -> Self {
        self.date_created_after = Some(date.into());
        self
    }

    /// Non-empty query parameters, in request order
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("To", &self.to),
            ("From", &self.from),
            ("DateCreatedOnOrBefore", &self.date_created_on_or_before),
            ("DateCreatedAfter", &self.date_created_after),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }

    /// `{api_base}/Accounts/{account_sid}/Messages.json?...&PageSize=1000`
    pub fn list_url(&self, api_base: &str, account_sid: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/Accounts/{}/Messages.json",
            api_base.trim_end_matches('/'),
            account_sid
        ))?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.query_pairs() {
                query.append_pair(key, value);
            }
            query.append_pair("PageSize", &PAGE_SIZE.to_string());
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_url_encodes_all_parameters() {
        let filter = MessageFilter::new()
            .to("+15550001")
            .from("whatsapp:+15550002")
            .created_on_or_before("2024-02-01")
            .created_after("2024-01-01");

        let url = filter
            .list_url("https://api.twilio.com/2010-04-01", "AC123")
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json\
             ?To=%2B15550001&From=whatsapp%3A%2B15550002\
             &DateCreatedOnOrBefore=2024-02-01&DateCreatedAfter=2024-01-01&PageSize=1000"
        );
    }

    #[test]
    fn test_list_url_omits_empty_parameters() {
        let filter = MessageFilter {
            to: Some("+15550001".to_string()),
            from: Some(String::new()),
            ..Default::default()
        };

        let url = filter.list_url("https://api.twilio.com/2010-04-01/", "AC123").unwrap();

        assert_eq!(url.path(), "/2010-04-01/Accounts/AC123/Messages.json");
        assert_eq!(url.query(), Some("To=%2B15550001&PageSize=1000"));
    }

    #[test]
    fn test_list_url_without_filter() {
        let url = MessageFilter::new()
            .list_url("https://api.twilio.com/2010-04-01", "AC123")
            .unwrap();
        assert_eq!(url.query(), Some("PageSize=1000"));
    }
}
