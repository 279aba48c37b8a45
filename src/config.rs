//! User configuration.
//!
//! Resolution order: built-in defaults, then `user-config.toml`, then
//! `WIKIBOT_*` environment variables (`WIKIBOT_MAX_RETRIES=3`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub family: String,
    pub lang: String,
    pub username: Option<String>,
    /// A bot password, see `Special:BotPasswords`.
    pub password: Option<String>,
    pub oauth_token: Option<String>,
    pub user_agent: Option<String>,
    /// How often a failed read request is retried.
    pub max_retries: u32,
    /// Seconds to wait before the first retry.
    pub retry_wait: u64,
    /// Upper bound of the doubling retry wait, in seconds.
    pub retry_max: u64,
    /// `maxlag` sent with every request, 0 disables it.
    pub maxlag: u32,
    /// Minimum seconds between two edits.
    pub put_throttle: u64,
    pub cache_dir: PathBuf,
    pub siteinfo_expiry_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            family: "wikipedia".into(),
            lang: "en".into(),
            username: None,
            password: None,
            oauth_token: None,
            user_agent: None,
            max_retries: 15,
            retry_wait: 5,
            retry_max: 120,
            maxlag: 5,
            put_throttle: 10,
            cache_dir: PathBuf::from("apicache"),
            siteinfo_expiry_days: 30,
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "user-config.toml";

    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(Self::FILE_NAME))
    }

    /// A missing file is not an error, the defaults and environment apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("loading config from {}", path.display());
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("WIKIBOT_"))
            .extract()?;
        Ok(config)
    }

    pub fn settings(&self) -> Settings {
        Settings {
            max_retries: self.max_retries,
            retry_wait: Duration::from_secs(self.retry_wait),
            retry_max: Duration::from_secs(self.retry_max),
            maxlag: (self.maxlag > 0).then(|| self.maxlag),
            put_throttle: Duration::from_secs(self.put_throttle),
            cache_dir: self.cache_dir.clone(),
            siteinfo_expiry: chrono::Duration::days(self.siteinfo_expiry_days),
        }
    }
}

/// The part of [`Config`] a site consults at runtime.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_retries: u32,
    pub retry_wait: Duration,
    pub retry_max: Duration,
    pub maxlag: Option<u32>,
    pub put_throttle: Duration,
    pub cache_dir: PathBuf,
    pub siteinfo_expiry: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().settings()
    }
}
