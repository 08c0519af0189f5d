//! In-memory transport and fixtures for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::transport::{RawResponse, Transport};

pub const HOST: &str = "https://api.example.test";
pub const ACCOUNT: &str = "AC123";

enum Scripted {
    Respond(RawResponse),
    Fail(String),
    Hang,
}

/// Replays canned responses per URL and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        tw_core::logging::init_for_tests();
        Self::default()
    }

    fn push(&self, url: &str, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(url, Scripted::Respond(RawResponse::new(status, body)));
        self
    }

    pub fn fail(&self, url: &str, reason: &str) -> &Self {
        self.push(url, Scripted::Fail(reason.to_string()));
        self
    }

    pub fn hang(&self, url: &str) -> &Self {
        self.push(url, Scripted::Hang);
        self
    }

    /// URLs requested so far, in order
    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    /// Form body of the most recent POST
    pub fn last_form(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|(_, body)| body.clone())
    }

    async fn next(&self, url: &str, body: Option<String>) -> Result<RawResponse> {
        self.requests.lock().unwrap().push((url.to_string(), body));

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(reason)) => Err(Error::Transport(reason)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(Error::Transport(format!("no scripted response for {}", url))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        self.next(url, None).await
    }

    async fn post(&self, url: &str, form_body: String) -> Result<RawResponse> {
        self.next(url, Some(form_body)).await
    }
}

/// Minimal message JSON with a send time
pub fn message(sid: &str, from: &str, to: &str, date_sent: &str) -> Value {
    json!({
        "sid": sid,
        "account_sid": ACCOUNT,
        "from": from,
        "to": to,
        "body": format!("body of {}", sid),
        "date_created": date_sent,
        "date_updated": date_sent,
        "date_sent": date_sent,
        "direction": "outbound-api",
        "num_media": "0",
        "num_segments": "1",
        "status": "delivered",
        "price": null,
        "error_code": null,
        "error_message": null,
    })
}

/// Page body with the given messages and cursor
pub fn page(messages: Vec<Value>, next_page_uri: Option<&str>) -> String {
    json!({
        "messages": messages,
        "next_page_uri": next_page_uri,
        "page_size": 1000,
    })
    .to_string()
}

/// Sent timestamp `seconds` after 2024-01-01 00:00:00 UTC, RFC 1123 formatted
pub fn sent_at(seconds: u32) -> String {
    format!("Mon, 01 Jan 2024 00:{:02}:{:02} +0000", seconds / 60, seconds % 60)
}

pub fn error_body(status: u16, code: i64, message: &str) -> String {
    json!({
        "status": status,
        "code": code,
        "message": message,
        "more_info": format!("https://www.twilio.com/docs/errors/{}", code),
    })
    .to_string()
}
