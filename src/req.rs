use std::fmt;
use std::sync::Arc;

use mwproc::Params;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::sealed::Access;
use crate::types::MwTimestamp;
use crate::url::{encode_multivalue, ParamWriter, WriteParams, WriteValue};
use crate::{api, util, Error, Result, Site, SiteInner};

pub use generator::*;

mod generator;

/// Actions that change the wiki. They are POSTed and never retried.
pub const WRITE_ACTIONS: &[&str] = &[
    "block",
    "changecontentmodel",
    "createaccount",
    "delete",
    "edit",
    "emailuser",
    "import",
    "managetags",
    "mergehistory",
    "move",
    "options",
    "patrol",
    "protect",
    "purge",
    "rollback",
    "tag",
    "unblock",
    "undelete",
    "upload",
    "userrights",
    "watch",
];

/// Longer query strings are sent as a POST body instead.
pub const MAX_GET_LENGTH: usize = 2000;

/// Anything that can be the value of a parameter.
pub trait ParamValue {
    fn into_values(self) -> Vec<String>;
}

impl ParamValue for &str {
    fn into_values(self) -> Vec<String> {
        vec![self.to_owned()]
    }
}

impl ParamValue for String {
    fn into_values(self) -> Vec<String> {
        vec![self]
    }
}

impl ParamValue for &String {
    fn into_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl ParamValue for Vec<String> {
    fn into_values(self) -> Vec<String> {
        self
    }
}

impl ParamValue for Vec<&str> {
    fn into_values(self) -> Vec<String> {
        self.into_iter().map(str::to_owned).collect()
    }
}

impl ParamValue for &[&str] {
    fn into_values(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_owned()).collect()
    }
}

impl<const N: usize> ParamValue for [&str; N] {
    fn into_values(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_owned()).collect()
    }
}

macro_rules! display_values {
    ($($ty:ty),*) => {$(
        impl ParamValue for $ty {
            fn into_values(self) -> Vec<String> {
                vec![self.to_string()]
            }
        }
    )*};
}

display_values!(u32, u64, i64, usize);

/// Parameters of one API call, bound to the site they are sent to.
///
/// Names keep the order they were first set in. Setting a name again
/// replaces its values in place.
#[derive(Clone)]
pub struct Request {
    site: Arc<SiteInner>,
    params: Vec<(String, Vec<String>)>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("site", &self.site.id())
            .field("params", &self.params)
            .finish()
    }
}

impl ParamWriter for Request {
    fn add(&mut self, name: &str, values: Vec<String>) {
        self.set(name, values);
    }
}

impl Request {
    pub fn new<A, K, V>(site: &Site<A>, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        A: Access,
        K: Into<String>,
        V: ParamValue,
    {
        let mut this = Self {
            site: site.inner().clone(),
            params: Vec::new(),
        };
        for (k, v) in params {
            this.set(k, v);
        }
        this
    }

    /// A request from typed parameters, such as [`Main`].
    pub fn from_params<A: Access, P: WriteParams + ?Sized>(site: &Site<A>, params: &P) -> Self {
        let mut this = Self::new::<A, String, String>(site, []);
        params.write_params(&mut this);
        this
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ParamValue) {
        let key = key.into();
        let values = value.into_values();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = values,
            None => self.params.push((key, values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| &**v)
    }

    /// The first value of `key`.
    pub fn get_one(&self, key: &str) -> Option<&str> {
        self.get(key)?.first().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let idx = self.params.iter().position(|(k, _)| k == key)?;
        Some(self.params.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.params.iter().map(|(k, v)| (k.as_str(), &**v))
    }

    /// Names with their multi-values joined, in order.
    pub fn encoded_items(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), encode_multivalue(v)))
            .collect()
    }

    pub fn action(&self) -> Option<&str> {
        self.get_one("action")
    }

    pub fn is_write(&self) -> bool {
        self.action().map_or(false, |a| WRITE_ACTIONS.contains(&a))
    }

    pub fn is_bound_to<A: Access>(&self, site: &Site<A>) -> bool {
        Arc::ptr_eq(&self.site, site.inner()) || self.site.id() == site.inner().id()
    }

    pub(crate) fn site(&self) -> &Arc<SiteInner> {
        &self.site
    }

    /// Copies a `continue` object of a previous response into the parameters.
    pub fn merge_continue(&mut self, cont: &Map<String, Value>) {
        for (k, v) in cont {
            self.set(k.as_str(), util::value_to_param(v));
        }
    }

    /// The parameters as sent, including the ones every request carries.
    pub fn http_params(&self) -> Vec<(String, String)> {
        let mut params = self.encoded_items();
        let mut extra = |k: &str, v: String| {
            if !self.contains_key(k) {
                params.push((k.to_owned(), v));
            }
        };
        extra("format", "json".into());
        extra("formatversion", "2".into());
        if let Some(lag) = self.site.settings.maxlag {
            extra("maxlag", lag.to_string());
        }
        if self.is_write() && self.site.user.is_some() {
            extra("assert", "user".into());
        }
        params
    }

    fn method(&self, params: &[(String, String)]) -> Result<Method> {
        if self.is_write() || self.action() == Some("login") {
            return Ok(Method::POST);
        }
        let len = serde_urlencoded::to_string(params)?.len();
        Ok(if len > MAX_GET_LENGTH {
            Method::POST
        } else {
            Method::GET
        })
    }

    async fn submit_once(&self) -> Result<Value> {
        let params = self.http_params();
        let method = self.method(&params)?;
        trace!(%method, action = ?self.action(), "sending request");
        let v = self
            .site
            .transport
            .call(method, &self.site.url, params)
            .await?;
        let v = api::check_response(v, self.get_one("title"))?;
        api::log_warnings(&v);
        Ok(v)
    }

    /// Sends the request.
    ///
    /// Read requests that fail with a transient error are sent again after
    /// a wait that doubles each time, up to `max_retries` times.
    pub async fn submit(self) -> Result<Value> {
        let settings = &self.site.settings;
        let retry = !self.is_write();
        let mut wait = settings.retry_wait;
        let mut attempts = 0;
        loop {
            match self.submit_once().await {
                Err(e) if retry && e.is_transient() => {
                    if attempts >= settings.max_retries {
                        return Err(Error::RetriesExhausted {
                            attempts,
                            source: Box::new(e),
                        });
                    }
                    attempts += 1;
                    warn!("{e}, retrying in {wait:?} (attempt {attempts})");
                    tokio::time::sleep(wait).await;
                    wait = (wait * 2).min(settings.retry_max);
                }
                res => return res,
            }
        }
    }
}

#[derive(Params, Clone, Debug)]
pub struct Main {
    pub action: Action,
}

impl Main {
    pub fn action(action: Action) -> Self {
        Self { action }
    }

    pub fn query(q: Query) -> Self {
        Self::action(Action::Query(q))
    }

    pub fn login(l: Login) -> Self {
        Self::action(Action::Login(l))
    }

    pub fn edit(e: Edit) -> Self {
        Self::action(Action::Edit(e))
    }

    pub fn tokens(t: TokenType) -> Self {
        Self::query(Query {
            meta: vec![QueryMeta::Tokens { type_: t }],
            ..Default::default()
        })
    }
}

#[derive(Params, Clone, Debug)]
pub enum Action {
    Query(Query),
    Edit(Edit),
    Login(Login),
}

#[derive(Params, Clone, Debug, Default)]
pub struct Query {
    pub titles: Vec<String>,
    pub pageids: Vec<u64>,
    /// Which properties to get for the queried pages.
    pub prop: QueryProp,
    #[mw(flatten)]
    pub revisions: Option<QueryPropRevisions>,
    pub meta: Vec<QueryMeta>,
    pub generator: Option<Generator>,
    pub curtimestamp: bool,
    pub redirects: bool,
}

mwproc::flags! {
    #[derive(Default)]
    pub struct QueryProp: u8 {
        const INFO = 1 << 0;
        const REVISIONS = 1 << 1;
        const CATEGORIES = 1 << 2;
        const LANGLINKS = 1 << 3;
        const TEMPLATES = 1 << 4;
    }
}

#[derive(Params, Clone, Debug)]
#[mw(prepend_all = "rv")]
pub struct QueryPropRevisions {
    pub prop: RvProp,
    pub slots: Vec<RvSlot>,
    pub limit: Option<Limit>,
}

impl QueryPropRevisions {
    /// Id, timestamp and text of the latest revision of each page.
    pub fn latest_content() -> Self {
        Self {
            prop: RvProp::IDS | RvProp::TIMESTAMP | RvProp::CONTENT,
            slots: vec![RvSlot::Main],
            limit: None,
        }
    }
}

mwproc::flags! {
    pub struct RvProp: u16 {
        const COMMENT = 1 << 0;
        const CONTENT = 1 << 1;
        const CONTENT_MODEL = 1 << 2;
        const FLAGS = 1 << 3;
        const IDS = 1 << 4;
        const SHA1 = 1 << 5;
        const SIZE = 1 << 6;
        const TAGS = 1 << 7;
        const TIMESTAMP = 1 << 8;
        const USER = 1 << 9;
    }
}

#[derive(Params, Clone, Copy, Debug)]
pub enum RvSlot {
    Main,
    #[mw(name = "*")]
    All,
}

#[derive(Params, Clone, Debug)]
pub enum QueryMeta {
    Tokens {
        #[mw(name = "type")]
        type_: TokenType,
    },
    SiteInfo {
        siprop: SiProp,
    },
    UserInfo {
        uiprop: UiProp,
    },
}

mwproc::flags! {
    pub struct TokenType: u8 {
        const CSRF = 1 << 0;
        const LOGIN = 1 << 1;
        const PATROL = 1 << 2;
        const ROLLBACK = 1 << 3;
        const WATCH = 1 << 4;
    }
}

mwproc::flags! {
    pub struct SiProp: u8 {
        const GENERAL = 1 << 0;
        const NAMESPACES = 1 << 1;
        const NAMESPACE_ALIASES = 1 << 2;
    }
}

mwproc::flags! {
    pub struct UiProp: u8 {
        const BLOCK_INFO = 1 << 0;
        const GROUPS = 1 << 1;
        const RIGHTS = 1 << 2;
    }
}

/// Number of items per batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Max,
    Value(u32),
}

impl WriteValue for Limit {
    fn values(&self) -> Option<Vec<String>> {
        Some(vec![match self {
            Limit::Max => "max".to_owned(),
            Limit::Value(n) => n.to_string(),
        }])
    }
}

#[derive(Params, Clone, Debug, Default)]
pub struct Edit {
    pub title: String,
    pub text: String,
    pub summary: String,
    pub minor: bool,
    pub notminor: bool,
    pub bot: bool,
    /// The timestamp of the revision the edit is based on.
    pub basetimestamp: Option<MwTimestamp>,
    /// When the text was loaded, to detect deletions in between.
    pub starttimestamp: Option<MwTimestamp>,
    pub createonly: bool,
    pub nocreate: bool,
    pub token: String,
}

#[derive(Params, Clone)]
pub struct Login {
    #[mw(name = "lgname")]
    pub name: String,
    #[mw(name = "lgpassword")]
    pub password: String,
    #[mw(name = "lgtoken")]
    pub token: String,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
