use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use api::{CsrfToken, QueryAllGenerator, Token, Transport};
use cache::CachedRequest;
use config::Settings;
use generators::{GeneratorStream, PageGenerator, WikiGenerator};
use page::{Namespaces, Page};
use req::{Main, Request};
use reqwest::header::InvalidHeaderValue;
use reqwest::Url;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

pub use crate::builder::SiteBuilder;
pub use crate::family::Family;

extern crate self as wikibot;

pub mod api;
pub mod builder;
pub mod cache;
pub mod config;
pub mod family;
pub mod generators;
pub mod macro_support;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod page;
pub mod pagegen;
pub mod req;
pub mod res;
pub mod textlib;
pub mod types;
pub mod url;
pub mod util;

#[derive(Clone, Debug)]
pub struct AnonymousAccess;

#[derive(Clone, Debug)]
pub struct AuthorizedAccess(());

pub(crate) mod sealed {
    pub trait Access: Send + Sync + 'static {}
    impl Access for super::AnonymousAccess {}
    impl Access for super::AuthorizedAccess {}
}

pub(crate) struct SiteInner {
    pub(crate) family: &'static Family,
    pub(crate) code: String,
    pub(crate) url: Url,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) settings: Settings,
    pub(crate) user: Option<String>,
    namespaces: OnceCell<Arc<Namespaces>>,
    last_put: Mutex<Option<tokio::time::Instant>>,
}

impl SiteInner {
    pub(crate) fn new(
        family: &'static Family,
        code: String,
        url: Url,
        transport: Arc<dyn Transport>,
        settings: Settings,
        user: Option<String>,
    ) -> Self {
        Self {
            family,
            code,
            url,
            transport,
            settings,
            user,
            namespaces: OnceCell::new(),
            last_put: Mutex::new(None),
        }
    }

    /// `wikipedia:en`
    pub(crate) fn id(&self) -> String {
        format!("{}:{}", self.family.name, self.code)
    }
}

/// One wiki of a family, such as the English Wikipedia.
pub struct Site<T: sealed::Access = AnonymousAccess> {
    inner: Arc<SiteInner>,
    acc: PhantomData<T>,
}

impl<T: sealed::Access> Clone for Site<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            acc: PhantomData,
        }
    }
}

impl<T: sealed::Access> fmt::Debug for Site<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("family", &self.inner.family.name)
            .field("code", &self.inner.code)
            .field("url", &self.inner.url)
            .field("user", &self.inner.user)
            .finish()
    }
}

impl<T: sealed::Access> fmt::Display for Site<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.id())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidUrl(#[from] ::url::ParseError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    SerdeUrlEncoded(#[from] serde_urlencoded::ser::Error),
    #[error(transparent)]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] Box<figment::Error>),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error("unknown family `{0}`")]
    UnknownFamily(String),
    #[error("family `{family}` has no wiki `{code}`")]
    UnknownSite { family: String, code: String },
    #[error("server error: {info}")]
    Server { code: Option<String>, info: String },
    #[error("maximum retries exceeded after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: Box<Error> },
    #[error("edit conflict on [[{title}]]")]
    EditConflict { title: String },
    #[error("cannot change [[{title}]] because of blacklist entry {url}")]
    SpamBlacklist { title: String, url: String },
    #[error("[[{title}]] is locked")]
    LockedPage { title: String },
    #[error("[[{title}]] does not exist")]
    NoPage { title: String },
    #[error("{0} is closed and cannot be edited")]
    ReadOnlySite(String),
    #[error("MediaWiki API returned error `{code}`: {info}")]
    MediaWiki { code: String, info: String },
    #[error("failed to log in")]
    Unauthorized,
    #[error("invalid item limit `{0}`")]
    InvalidLimit(String),
    #[error("{0}")]
    InvalidArgument(String),
}

impl Error {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Server { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Rejections of a single edit, after which a bot moves on to the next page.
    pub fn is_save_related(&self) -> bool {
        matches!(
            self,
            Self::EditConflict { .. }
                | Self::SpamBlacklist { .. }
                | Self::LockedPage { .. }
                | Self::NoPage { .. }
                | Self::MediaWiki { .. }
        )
    }
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type Bot = Site<AuthorizedAccess>;

/// Flags of a single edit.
#[derive(Clone, Debug, Default)]
pub struct EditOptions {
    pub summary: String,
    pub minor: bool,
    pub bot: bool,
    /// fail if the page exists.
    pub createonly: bool,
    /// fail if the page does not exist.
    pub nocreate: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveResult {
    pub new_revision: Option<u64>,
    pub nochange: bool,
}

impl<A: sealed::Access> Site<A> {
    pub(crate) fn from_inner(inner: SiteInner) -> Self {
        Self {
            inner: Arc::new(inner),
            acc: PhantomData,
        }
    }

    pub(crate) fn inner(&self) -> &Arc<SiteInner> {
        &self.inner
    }

    pub fn family(&self) -> &'static Family {
        self.inner.family
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    pub fn api_url(&self) -> &Url {
        &self.inner.url
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// The logged-in user.
    pub fn user(&self) -> Option<&str> {
        self.inner.user.as_deref()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.settings.cache_dir
    }

    pub fn request<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Request
    where
        K: Into<String>,
        V: req::ParamValue,
    {
        Request::new(self, params)
    }

    pub fn cached_request<K, V>(
        &self,
        expiry: chrono::Duration,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> CachedRequest
    where
        K: Into<String>,
        V: req::ParamValue,
    {
        CachedRequest::new(expiry, Request::new(self, params))
    }

    pub fn page_generator<K, V>(
        &self,
        generator: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> PageGenerator
    where
        K: Into<String>,
        V: req::ParamValue,
    {
        PageGenerator::new(self, generator, params)
    }

    pub fn full_url(&self, title: &str) -> String {
        self.inner.family.article_url(&self.inner.code, title)
    }

    /// Fetches a rendered page, or anything else that is not the API.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let url: Url = url.parse()?;
        self.inner.transport.fetch_text(&url).await
    }

    /// The namespaces of this wiki, fetched once through the cache.
    pub async fn namespaces(&self) -> Result<Arc<Namespaces>> {
        self.inner
            .namespaces
            .get_or_try_init(|| async {
                let res = CachedRequest::new(
                    self.inner.settings.siteinfo_expiry,
                    Request::new(
                        self,
                        [
                            ("action", "query"),
                            ("meta", "siteinfo"),
                            ("siprop", "namespaces|namespacealiases"),
                        ],
                    ),
                )
                .submit()
                .await?;
                Ok::<_, Error>(Arc::new(Namespaces::from_siteinfo(&res)?))
            })
            .await
            .cloned()
    }

    pub async fn get_token<T: Token>(&self) -> Result<T> {
        let res = Request::from_params(self, &Main::tokens(T::types())).submit().await?;
        let res: api::QueryResponse<api::Tokens<T>> = serde_json::from_value(res)?;
        Ok(res.query.tokens)
    }

    /// A page with its latest revision.
    pub async fn fetch_page(&self, title: &str) -> Result<Page> {
        let mut page = Page::new(title);
        self.load_page(&mut page).await?;
        Ok(page)
    }

    /// Fills in text, revision and flags of `page`.
    pub async fn load_page(&self, page: &mut Page) -> Result<()> {
        let q = req::Query {
            titles: vec![page.title.clone()],
            prop: req::QueryProp::INFO | req::QueryProp::REVISIONS,
            revisions: Some(req::QueryPropRevisions::latest_content()),
            curtimestamp: true,
            ..Default::default()
        };
        let res = Request::from_params(self, &Main::query(q)).submit().await?;
        let start = res::curtimestamp(&res)?;
        let mut pages = res::pages(res)?;
        if pages.len() != 1 {
            return Err(Error::MediaWiki {
                code: "unexpectedresponse".into(),
                info: format!("expected one page, got {}", pages.len()),
            });
        }
        let mut loaded = Page::from_response(pages.remove(0));
        loaded.start_timestamp = start;
        debug!(title = %loaded.title, exists = loaded.exists(), "loaded page");
        *page = loaded;
        Ok(())
    }

    /// Every response of a continued query, whole.
    pub fn query_all(&self, query: req::Query) -> GeneratorStream<QueryAllGenerator> {
        QueryAllGenerator::new(Request::from_params(self, &Main::query(query))).into_stream()
    }
}

impl Bot {
    pub async fn csrf_token(&self) -> Result<String> {
        let CsrfToken { token } = self.get_token().await?;
        Ok(token)
    }

    /// Waits until the previous edit is at least `put_throttle` ago.
    async fn throttle(&self) {
        let mut last = self.inner.last_put.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.inner.settings.put_throttle).await;
        }
        *last = Some(tokio::time::Instant::now());
    }

    /// Replaces the text of `page`, which should have been loaded before so
    /// that edit conflicts are detected.
    pub async fn save(&self, page: &Page, text: &str, options: &EditOptions) -> Result<SaveResult> {
        if self.inner.family.is_closed(&self.inner.code) {
            return Err(Error::ReadOnlySite(self.inner.id()));
        }
        self.throttle().await;
        let token = self.csrf_token().await?;
        let edit = req::Edit {
            title: page.title.clone(),
            text: text.to_owned(),
            summary: options.summary.clone(),
            minor: options.minor,
            notminor: !options.minor,
            bot: options.bot,
            basetimestamp: page.base_timestamp,
            starttimestamp: page.start_timestamp,
            createonly: options.createonly,
            nocreate: options.nocreate,
            token,
        };
        let res = Request::from_params(self, &Main::edit(edit)).submit().await?;
        let edit = res.get("edit").ok_or_else(|| Error::MediaWiki {
            code: "unexpectedresponse".into(),
            info: res.to_string(),
        })?;
        match edit.get("result").and_then(Value::as_str) {
            Some("Success") => {
                let result = SaveResult {
                    new_revision: edit.get("newrevid").and_then(Value::as_u64),
                    nochange: edit.get("nochange").is_some(),
                };
                info!(title = %page.title, revision = ?result.new_revision, "saved page");
                Ok(result)
            }
            _ => Err(api::edit_failure(edit, &page.title)),
        }
    }
}

#[derive(Clone)]
pub struct BotPassword {
    username: String,
    password: String,
}

impl BotPassword {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BotPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotPassword")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

const UA: &str = concat!(
    "wikibot",
    "/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/wikibot-rs/wikibot)"
);

#[cfg(test)]
mod tests;
