use std::borrow::Cow;
use std::marker::PhantomData;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{ClientBuilder, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{LoginToken, QueryResponse, Transport, UserInfo, UserInfoInner};
use crate::config::{Config, Settings};
use crate::req::{self, Login, Main, Request};
use crate::sealed::Access;
use crate::{
    AnonymousAccess, AuthorizedAccess, BotPassword, Error, Family, Result, Site, SiteInner, UA,
};

pub struct SiteBuilder<A: Access> {
    family: String,
    code: String,
    client: ClientBuilder,
    transport: Option<Arc<dyn Transport>>,
    user_agent: Option<Cow<'static, str>>,
    settings: Settings,
    oauth: Option<String>,
    password: Option<BotPassword>,
    _ph: PhantomData<A>,
}

impl<A: Access> SiteBuilder<A> {
    pub fn user_agent(mut self, ua: impl Into<Cow<'static, str>>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sends requests through `transport` instead of an HTTP client.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    fn into_access<B: Access>(self, oauth: Option<String>, password: Option<BotPassword>) -> SiteBuilder<B> {
        SiteBuilder {
            family: self.family,
            code: self.code,
            client: self.client,
            transport: self.transport,
            user_agent: self.user_agent,
            settings: self.settings,
            oauth,
            password,
            _ph: PhantomData,
        }
    }

    fn build_inner(mut self) -> Result<(SiteInner, Option<BotPassword>)> {
        let family = Family::load(&self.family)?;
        if family.is_removed(&self.code) || !family.has_code(&self.code) {
            return Err(Error::UnknownSite {
                family: self.family,
                code: self.code,
            });
        }
        let url: Url = family.api_url(&self.code).parse()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let ua = self.user_agent.as_deref().unwrap_or(UA);
                #[cfg(feature = "cookies")]
                {
                    self.client = self.client.cookie_store(true);
                }
                let mut headers = HeaderMap::new();
                if let Some(token) = &self.oauth {
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!("Bearer {token}"))?,
                    );
                }
                let client = self
                    .client
                    .user_agent(ua)
                    .gzip(true)
                    .default_headers(headers)
                    .build()?;
                Arc::new(client)
            }
        };
        let inner = SiteInner::new(family, self.code, url, transport, self.settings, None);
        Ok((inner, self.password))
    }
}

impl SiteBuilder<AnonymousAccess> {
    // creation of new sites. Only get anonymous access since not logged in.
    pub fn new(family: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            code: code.into(),
            client: reqwest::Client::builder(),
            transport: None,
            user_agent: None,
            settings: Settings::default(),
            oauth: None,
            password: None,
            _ph: PhantomData,
        }
    }

    /// Site, user agent and runtime settings from the configuration.
    /// Credentials are picked with [`password`](Self::password) or
    /// [`oauth`](Self::oauth).
    pub fn from_config(config: &Config) -> Self {
        let mut this = Self::new(&config.family, &config.lang).settings(config.settings());
        if let Some(ua) = &config.user_agent {
            this = this.user_agent(ua.clone());
        }
        this
    }

    pub fn enwiki() -> Self {
        Self::new("wikipedia", "en")
    }

    pub fn test_wikipedia() -> Self {
        Self::new("wikipedia", "test")
    }

    pub fn password(self, pass: BotPassword) -> SiteBuilder<AuthorizedAccess> {
        self.into_access(None, Some(pass))
    }

    /// to login via oauth, go to
    /// https://meta.wikimedia.org/wiki/Special:OAuthConsumerRegistration/propose/oauth2
    /// and create an owner-only application.
    pub fn oauth(self, token: impl Into<String>) -> SiteBuilder<AuthorizedAccess> {
        self.into_access(Some(token.into()), None)
    }

    /// build anonymous access
    pub fn build(self) -> Result<Site<AnonymousAccess>> {
        let (inner, _) = self.build_inner()?;
        Ok(Site::from_inner(inner))
    }
}

fn is_ip(name: &str) -> bool {
    Ipv4Addr::from_str(name).is_ok() || Ipv6Addr::from_str(name).is_ok()
}

impl SiteBuilder<AuthorizedAccess> {
    /// build by logging in.
    pub async fn build(self) -> Result<Site<AuthorizedAccess>> {
        let (inner, password) = self.build_inner()?;
        let site: Site<AnonymousAccess> = Site::from_inner(inner);

        if let Some(pass) = password {
            let LoginToken { token } = site.get_token::<LoginToken>().await?;
            let l = Main::login(Login {
                name: pass.username,
                password: pass.password,
                token,
            });
            let v: Value = Request::from_params(&site, &l).submit().await?;
            debug!("{v}");
            let result = v
                .get("login")
                .and_then(|v| v.get("result"))
                .and_then(Value::as_str);
            if result != Some("Success") {
                debug!(?result, "login was rejected");
                return Err(Error::Unauthorized);
            }
        }

        // we have built the site, now we need to check that we are actually logged in.
        let res = Request::from_params(
            &site,
            &Main::query(req::Query {
                meta: vec![req::QueryMeta::UserInfo {
                    uiprop: req::UiProp::empty(),
                }],
                ..Default::default()
            }),
        )
        .submit()
        .await?;
        let QueryResponse {
            query:
                UserInfo {
                    userinfo: UserInfoInner { id, name, anon },
                },
        } = serde_json::from_value(res)?;

        // if we are an IP, then we are definitely not logged in.
        if anon || id == 0 || is_ip(&name) {
            return Err(Error::Unauthorized);
        }

        info!("Logged in as \"{name}\" (id {id})");

        let inner = site.inner();
        Ok(Site::from_inner(SiteInner::new(
            inner.family,
            inner.code.clone(),
            inner.url.clone(),
            inner.transport.clone(),
            inner.settings.clone(),
            Some(name),
        )))
    }
}
