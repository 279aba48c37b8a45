use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Settings;
use crate::mock::MockTransport;
use crate::{Bot, BotPassword, Site, SiteBuilder};

mod pagegen;
mod types;

/// No waiting, and a cache of its own.
fn settings(cache: &TempDir) -> Settings {
    Settings {
        max_retries: 3,
        retry_wait: Duration::ZERO,
        retry_max: Duration::ZERO,
        maxlag: None,
        put_throttle: Duration::ZERO,
        cache_dir: cache.path().to_owned(),
        siteinfo_expiry: chrono::Duration::days(30),
    }
}

fn site() -> (Site, Arc<MockTransport>, TempDir) {
    site_with(|_| {})
}

/// A site with settings changed by `f`.
fn site_with(f: impl FnOnce(&mut Settings)) -> (Site, Arc<MockTransport>, TempDir) {
    let cache = tempfile::tempdir().unwrap();
    let mut settings = settings(&cache);
    f(&mut settings);
    let mock = MockTransport::new();
    let site = SiteBuilder::enwiki()
        .settings(settings)
        .transport(mock.clone())
        .build()
        .unwrap();
    (site, mock, cache)
}

async fn bot() -> (Bot, Arc<MockTransport>, TempDir) {
    bot_with(|_| {}).await
}

async fn bot_with(f: impl FnOnce(&mut Settings)) -> (Bot, Arc<MockTransport>, TempDir) {
    let cache = tempfile::tempdir().unwrap();
    let mut settings = settings(&cache);
    f(&mut settings);
    let mock = MockTransport::new();
    mock.push_login("Example");
    let bot = SiteBuilder::enwiki()
        .settings(settings)
        .transport(mock.clone())
        .password(BotPassword::new("Example@bot", "hunter2"))
        .build()
        .await
        .unwrap();
    assert_eq!(mock.remaining(), 0);
    (bot, mock, cache)
}

fn page_json(title: &str) -> Value {
    json!({ "pageid": 1, "ns": 0, "title": title })
}
