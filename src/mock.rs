//! A [`Transport`] that answers from a script, for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::api::{BoxFuture, Transport};
use crate::{Error, Result};

/// One call the transport received.
#[derive(Clone, Debug)]
pub struct Call {
    pub method: Method,
    pub url: Url,
    pub params: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    responses: VecDeque<Result<Value>>,
    pages: VecDeque<Result<String>>,
    calls: Vec<Call>,
}

/// Answers API calls in the order the responses were pushed.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // a test that panicked while holding the lock has failed anyway
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, v: Value) -> &Self {
        self.state().responses.push_back(Ok(v));
        self
    }

    pub fn push_error(&self, e: Error) -> &Self {
        self.state().responses.push_back(Err(e));
        self
    }

    pub fn push_html(&self, text: impl Into<String>) -> &Self {
        self.state().pages.push_back(Ok(text.into()));
        self
    }

    /// What a successful login with a bot password looks like.
    pub fn push_login(&self, name: &str) -> &Self {
        self.push(json!({ "query": { "tokens": { "logintoken": "lt+\\" } } }))
            .push(json!({ "login": { "result": "Success", "lguserid": 1, "lgusername": name } }))
            .push(json!({ "query": { "userinfo": { "id": 1, "name": name } } }))
    }

    pub fn push_csrf(&self) -> &Self {
        self.push(json!({ "query": { "tokens": { "csrftoken": "csrf+\\" } } }))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn remaining(&self) -> usize {
        self.state().responses.len()
    }
}

impl Transport for MockTransport {
    fn call<'a>(
        &'a self,
        method: Method,
        url: &'a Url,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<Value>> {
        let mut state = self.state();
        state.calls.push(Call {
            method,
            url: url.clone(),
            params,
        });
        let res = state.responses.pop_front().unwrap_or_else(|| {
            Err(Error::MediaWiki {
                code: "mock".into(),
                info: "no response queued".into(),
            })
        });
        Box::pin(async move { res })
    }

    fn fetch_text<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String>> {
        let res = self.state().pages.pop_front().unwrap_or_else(|| {
            Err(Error::MediaWiki {
                code: "mock".into(),
                info: format!("no page queued for {url}"),
            })
        });
        Box::pin(async move { res })
    }
}
