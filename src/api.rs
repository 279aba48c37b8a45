use std::future::Future;
use std::pin::Pin;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{trace, warn};

use crate::generators::WikiGenerator;
use crate::req::{Request, TokenType};
use crate::{Error, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Moves requests to the wiki and back.
///
/// Implemented for [`reqwest::Client`]. Tests substitute a scripted one.
pub trait Transport: Send + Sync {
    /// Calls the API and returns the decoded JSON body.
    fn call<'a>(
        &'a self,
        method: Method,
        url: &'a Url,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<Value>>;

    /// Fetches anything else as text.
    fn fetch_text<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String>>;
}

impl Transport for reqwest::Client {
    fn call<'a>(
        &'a self,
        method: Method,
        url: &'a Url,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let req = if method == Method::POST {
                self.post(url.clone()).form(&params)
            } else {
                self.get(url.clone()).query(&params)
            };
            let res = req.send().await?;
            let status = res.status();
            trace!(%status, "received response");
            if status.is_server_error() {
                return Err(Error::Server {
                    code: None,
                    info: format!("HTTP {status}"),
                });
            }
            Ok(res.error_for_status()?.json::<Value>().await?)
        })
    }

    fn fetch_text<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let res = self.get(url.clone()).send().await?;
            if res.status().is_server_error() {
                return Err(Error::Server {
                    code: None,
                    info: format!("HTTP {}", res.status()),
                });
            }
            Ok(res.error_for_status()?.text().await?)
        })
    }
}

/// Turns an `error` object in a response into an [`Error`].
pub fn check_response(mut v: Value, title: Option<&str>) -> Result<Value> {
    match v.get_mut("error") {
        Some(err) => Err(api_error(err.take(), title)),
        None => Ok(v),
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn spam_url(v: &Value) -> Option<String> {
    match v.get("spamblacklist")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(o) => o
            .get("matches")?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .next()
            .map(str::to_owned),
        _ => None,
    }
}

pub fn api_error(err: Value, title: Option<&str>) -> Error {
    let code = str_field(&err, "code");
    let info = str_field(&err, "info");
    let title = title.unwrap_or_default().to_owned();
    match code.as_str() {
        "editconflict" => Error::EditConflict { title },
        "spamblacklist" => Error::SpamBlacklist {
            title,
            url: spam_url(&err).unwrap_or(info),
        },
        "protectedpage" | "cascadeprotected" | "protectedtitle" => Error::LockedPage { title },
        c if c.starts_with("protectednamespace") => Error::LockedPage { title },
        "missingtitle" => Error::NoPage { title },
        "maxlag" | "readonly" | "ratelimited" => Error::Server {
            code: Some(code),
            info,
        },
        c if c.starts_with("internal_api_error") => Error::Server {
            code: Some(code),
            info,
        },
        "assertuserfailed" | "assertbotfailed" => Error::Unauthorized,
        _ => Error::MediaWiki { code, info },
    }
}

/// An `edit` object whose result is not `Success`.
pub fn edit_failure(edit: &Value, title: &str) -> Error {
    if let Some(url) = spam_url(edit) {
        return Error::SpamBlacklist {
            title: title.to_owned(),
            url,
        };
    }
    Error::MediaWiki {
        code: edit
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or("editfailure")
            .to_owned(),
        info: edit.to_string(),
    }
}

/// `{"warnings": {"query": {"warnings": "..."}}}`
pub fn log_warnings(v: &Value) {
    let Some(warnings) = v.get("warnings").and_then(Value::as_object) else {
        return;
    };
    for (module, w) in warnings {
        let text = w
            .get("warnings")
            .or_else(|| w.get("*"))
            .and_then(Value::as_str)
            .map_or_else(|| w.to_string(), str::to_owned);
        warn!(module = %module, "API warning: {text}");
    }
}

#[derive(Deserialize, Debug)]
pub struct QueryResponse<Q> {
    pub query: Q,
}

#[derive(Deserialize, Debug)]
pub struct Tokens<T> {
    pub tokens: T,
}

macro_rules! token {
    ($Name:ident = $field:literal = $t:expr) => {
        #[derive(Deserialize, Debug)]
        pub struct $Name {
            #[serde(rename = $field)]
            pub token: String,
        }
        impl Token for $Name {
            fn types() -> TokenType {
                $t
            }
        }
    };
}

token!(LoginToken = "logintoken" = TokenType::LOGIN);
token!(CsrfToken = "csrftoken" = TokenType::CSRF);

pub trait Token: DeserializeOwned {
    fn types() -> TokenType;
}

#[derive(Deserialize, Debug)]
pub struct UserInfo {
    pub userinfo: UserInfoInner,
}

#[derive(Deserialize, Debug)]
pub struct UserInfoInner {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "crate::util::flag::deserialize")]
    pub anon: bool,
}

/// Yields each continued response of a query unchanged.
pub struct QueryAllGenerator {
    request: Request,
}

impl QueryAllGenerator {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

impl WikiGenerator for QueryAllGenerator {
    type Item = Value;

    fn create_request(&self) -> Request {
        self.request.clone()
    }

    fn untangle_response(&self, res: Value) -> Result<Vec<Value>> {
        Ok(vec![res])
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn classify() {
        let e = |code: &str| api_error(json!({ "code": code, "info": "x" }), Some("Foo"));
        assert!(matches!(e("editconflict"), Error::EditConflict { title } if title == "Foo"));
        assert!(matches!(e("protectedpage"), Error::LockedPage { .. }));
        assert!(matches!(e("protectednamespace-interface"), Error::LockedPage { .. }));
        assert!(matches!(e("missingtitle"), Error::NoPage { .. }));
        assert!(e("maxlag").is_transient());
        assert!(e("internal_api_error_DBQueryError").is_transient());
        assert!(matches!(e("badtoken"), Error::MediaWiki { code, .. } if code == "badtoken"));
        assert!(!e("badtoken").is_transient());
    }

    #[test]
    fn spam_blacklist() {
        let err = api_error(
            json!({
                "code": "spamblacklist",
                "info": "blocked",
                "spamblacklist": { "matches": ["spam.example.org"] },
            }),
            Some("Foo"),
        );
        assert!(matches!(err, Error::SpamBlacklist { url, .. } if url == "spam.example.org"));

        let err = edit_failure(
            &json!({ "result": "Failure", "spamblacklist": "spam.example.org" }),
            "Foo",
        );
        assert!(err.is_save_related());
        assert!(matches!(err, Error::SpamBlacklist { url, .. } if url == "spam.example.org"));
    }

    #[test]
    fn check() {
        assert!(check_response(json!({ "batchcomplete": true }), None).is_ok());
        assert!(check_response(json!({ "error": { "code": "readonly" } }), None)
            .unwrap_err()
            .is_transient());
    }
}
