//! Cursor-following page walker
//!
//! A walk fetches the first page, then keeps fetching whatever
//! `next_page_uri` each page points at until a page has none. The cursor
//! already carries the filter, so it is fetched verbatim.
//!
//! A walk either returns every record of every page, in server order, or an
//! error. Records from pages fetched before a failure are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use tw_core::TwilioConfig;

use crate::decode::{decode_response, STATUS_OK};
use crate::error::{Error, Result};
use crate::transport::{RawResponse, Transport};
use crate::types::{MessagePage, MessageRecord};

/// Turn a cursor into an absolute URL.
///
/// Host-relative cursors (`/2010-04-01/...`) are appended to `api_host`,
/// keeping any path prefix it carries. Absolute cursors must share the
/// origin of `api_host`; anything else is `Error::Pagination`.
pub fn resolve_cursor(api_host: &Url, cursor: &str) -> Result<Url> {
    let foreign = || {
        Error::Pagination(format!(
            "cursor {} does not point at {}",
            cursor,
            api_host.origin().ascii_serialization()
        ))
    };

    if cursor.starts_with("//") {
        return Err(foreign());
    }
    if cursor.starts_with('/') {
        let base = api_host.as_str().trim_end_matches('/');
        return Ok(Url::parse(&format!("{}{}", base, cursor))?);
    }

    let url = Url::parse(cursor)?;
    if url.origin() != api_host.origin() {
        return Err(foreign());
    }
    Ok(url)
}

/// Split a page into its records and the cursor of the next page, if any
pub fn unpack_page(page: MessagePage) -> (Vec<MessageRecord>, Option<String>) {
    let cursor = page
        .next_page_uri
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    (page.messages, cursor)
}

/// Walks a paginated message list to the end
#[derive(Clone)]
pub struct PageWalker {
    transport: Arc<dyn Transport>,
    api_host: Url,
}

impl PageWalker {
    pub fn new(transport: Arc<dyn Transport>, config: &TwilioConfig) -> Result<Self> {
        let api_host = Url::parse(&config.api_host)?;
        Ok(Self { transport, api_host })
    }

    /// Collect every record reachable from `start_url`
    pub async fn walk(&self, start_url: &str) -> Result<Vec<MessageRecord>> {
        self.walk_until_cancelled(start_url, &CancellationToken::new())
            .await
    }

    /// Like [`walk`](Self::walk), aborting the in-flight fetch with
    /// `Error::Cancelled` as soon as `cancel` fires
    pub async fn walk_until_cancelled(
        &self,
        start_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MessageRecord>> {
        let mut records = Vec::new();
        let mut next_url = Some(start_url.to_string());
        let mut pages = 0usize;
        let mut visited = HashSet::new();

        while let Some(url) = next_url.take() {
            if !visited.insert(url.clone()) {
                return Err(Error::Pagination(format!("cursor loops back to {}", url)));
            }

            let response = self.fetch(&url, cancel).await?;
            let page: MessagePage = decode_response(&response, STATUS_OK)?;
            let (batch, cursor) = unpack_page(page);
            pages += 1;

            debug!(
                page = pages,
                records = batch.len(),
                has_next = cursor.is_some(),
                "Fetched {}",
                url
            );
            records.extend(batch);

            if let Some(cursor) = cursor {
                next_url = Some(resolve_cursor(&self.api_host, &cursor)?.to_string());
            }
        }

        info!(pages, records = records.len(), "Walked {}", start_url);
        Ok(records)
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<RawResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Walk cancelled before {} completed", url);
                Err(Error::Cancelled)
            }
            response = self.transport.get(url) => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{error_body, message, page, sent_at, ScriptedTransport, HOST};

    const START: &str = "https://api.example.test/2010-04-01/Accounts/AC123/Messages.json?To=%2B1&PageSize=1000";

    fn cursor(n: usize) -> String {
        format!("/2010-04-01/Accounts/AC123/Messages.json?To=%2B1&PageSize=1000&Page={}&PageToken=PA{}", n, n)
    }

    fn absolute(n: usize) -> String {
        format!("{}{}", HOST, cursor(n))
    }

    fn walker(transport: Arc<ScriptedTransport>) -> PageWalker {
        let config = TwilioConfig::new("AC123", "token").with_api_host(HOST);
        PageWalker::new(transport, &config).unwrap()
    }

    /// Script `sizes.len()` linked pages; page `i` holds `sizes[i]` records.
    /// With `link_last`, the final page points at one more (unscripted) page.
    fn script_linked(transport: &ScriptedTransport, sizes: &[usize], link_last: bool) -> Vec<String> {
        let mut expected = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let url = if i == 0 { START.to_string() } else { absolute(i) };
            let messages = (0..*size)
                .map(|j| {
                    let sid = format!("SM{}_{}", i, j);
                    expected.push(sid.clone());
                    message(&sid, "+2", "+1", &sent_at(j as u32))
                })
                .collect();
            let next = (link_last || i + 1 < sizes.len()).then(|| cursor(i + 1));
            transport.respond(&url, 200, page(messages, next.as_deref()));
        }
        expected
    }

    fn script_pages(transport: &ScriptedTransport, sizes: &[usize]) -> Vec<String> {
        script_linked(transport, sizes, false)
    }

    #[test]
    fn test_resolve_relative_cursor() {
        let host = Url::parse("https://api.twilio.com").unwrap();
        let url = resolve_cursor(
            &host,
            "/2010-04-01/Accounts/AC1/Messages.json?PageSize=1000&Page=1&PageToken=PASM9",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twilio.com/2010-04-01/Accounts/AC1/Messages.json?PageSize=1000&Page=1&PageToken=PASM9"
        );
    }

    #[test]
    fn test_resolve_relative_cursor_keeps_host_path() {
        let host = Url::parse("https://proxy.example.test/twilio").unwrap();
        let url = resolve_cursor(&host, "/2010-04-01/Accounts/AC1/Messages.json?Page=1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.example.test/twilio/2010-04-01/Accounts/AC1/Messages.json?Page=1"
        );
    }

    #[test]
    fn test_resolve_absolute_cursor() {
        let host = Url::parse("https://api.twilio.com").unwrap();
        let url = resolve_cursor(&host, "https://api.twilio.com/2010-04-01/next?Page=2").unwrap();
        assert_eq!(url.as_str(), "https://api.twilio.com/2010-04-01/next?Page=2");
    }

    #[test]
    fn test_resolve_rejects_cursor_on_other_host() {
        let host = Url::parse("https://api.twilio.com").unwrap();

        let scheme_relative = resolve_cursor(&host, "//evil.example/steal?Page=1");
        assert!(matches!(scheme_relative, Err(Error::Pagination(_))));

        let absolute = resolve_cursor(&host, "https://evil.example/steal?Page=1");
        assert!(matches!(absolute, Err(Error::Pagination(_))));

        let downgraded = resolve_cursor(&host, "http://api.twilio.com/2010-04-01/next");
        assert!(matches!(downgraded, Err(Error::Pagination(_))));
    }

    #[test]
    fn test_unpack_page_treats_empty_cursor_as_last_page() {
        let page = MessagePage {
            messages: vec![MessageRecord::default()],
            next_page_uri: Some("  ".to_string()),
            ..Default::default()
        };
        let (records, cursor) = unpack_page(page);
        assert_eq!(records.len(), 1);
        assert!(cursor.is_none());
    }

    #[tokio::test]
    async fn test_walk_follows_every_cursor() {
        let transport = Arc::new(ScriptedTransport::new());
        let expected = script_pages(&transport, &[2, 1, 3]);

        let records = walker(transport.clone()).walk(START).await.unwrap();

        let sids: Vec<_> = records.iter().map(|m| m.sid.clone()).collect();
        assert_eq!(sids, expected);
        assert_eq!(transport.urls(), vec![START.to_string(), absolute(1), absolute(2)]);
    }

    #[tokio::test]
    async fn test_walk_keeps_going_past_empty_middle_pages() {
        let transport = Arc::new(ScriptedTransport::new());
        let expected = script_pages(&transport, &[1, 0, 0, 2]);

        let records = walker(transport.clone()).walk(START).await.unwrap();

        assert_eq!(records.len(), expected.len());
        assert_eq!(transport.urls().len(), 4);
    }

    #[tokio::test]
    async fn test_walk_empty_first_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(START, 200, page(vec![], None));

        let records = walker(transport.clone()).walk(START).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_walk_aborts_on_api_error_without_partial_results() {
        for failing_page in 0..3 {
            let transport = Arc::new(ScriptedTransport::new());
            script_linked(&transport, &vec![2; failing_page], true);

            let failing_url = if failing_page == 0 { START.to_string() } else { absolute(failing_page) };
            transport.respond(&failing_url, 429, error_body(429, 20429, "Too Many Requests"));

            let result = walker(transport.clone()).walk(START).await;

            let err = result.unwrap_err();
            let api = err.as_api().expect("expected an API error");
            assert_eq!(api.status, 429);
            assert_eq!(api.exception.code, 20429);
            assert_eq!(transport.urls().len(), failing_page + 1);
        }
    }

    #[tokio::test]
    async fn test_walk_aborts_on_transport_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(START, 200, page(vec![message("SM1", "+2", "+1", &sent_at(1))], Some(cursor(1).as_str())));
        transport.fail(&absolute(1), "connection reset");

        let result = walker(transport).walk(START).await;
        assert!(matches!(result, Err(Error::Transport(ref r)) if r == "connection reset"));
    }

    #[tokio::test]
    async fn test_walk_rejects_undecodable_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(START, 200, "not json");

        let result = walker(transport).walk(START).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn test_walk_cancelled_mid_fetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(START, 200, page(vec![message("SM1", "+2", "+1", &sent_at(1))], Some(cursor(1).as_str())));
        transport.hang(&absolute(1));

        let cancel = CancellationToken::new();
        let walker = walker(transport.clone());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = walker.walk_until_cancelled(START, &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(transport.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_walk_under_host_path_prefix() {
        let transport = Arc::new(ScriptedTransport::new());
        let host = "https://proxy.example.test/twilio";
        let start = format!("{}/2010-04-01/Accounts/AC123/Messages.json?To=%2B1&PageSize=1000", host);
        transport.respond(&start, 200, page(vec![message("SM1", "+2", "+1", &sent_at(1))], Some(cursor(1).as_str())));
        transport.respond(&format!("{}{}", host, cursor(1)), 200, page(vec![message("SM2", "+2", "+1", &sent_at(2))], None));

        let config = TwilioConfig::new("AC123", "token").with_api_host(host);
        let records = PageWalker::new(transport.clone(), &config)
            .unwrap()
            .walk(&start)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(transport.urls()[1], format!("{}{}", host, cursor(1)));
    }

    #[tokio::test]
    async fn test_walk_stops_on_cursor_cycle() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(START, 200, page(vec![message("SM1", "+2", "+1", &sent_at(1))], Some(cursor(1).as_str())));
        transport.respond(&absolute(1), 200, page(vec![message("SM2", "+2", "+1", &sent_at(2))], Some(cursor(1).as_str())));

        let result = walker(transport.clone()).walk(START).await;

        assert!(matches!(result, Err(Error::Pagination(_))));
        assert_eq!(transport.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_walk_already_cancelled_issues_no_fetch() {
        let transport = Arc::new(ScriptedTransport::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = walker(transport.clone()).walk_until_cancelled(START, &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(transport.urls().is_empty());
    }
}
