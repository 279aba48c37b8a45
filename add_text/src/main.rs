use clap::Parser;
use color_eyre::eyre::{bail, eyre};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wikibot::config::Config;
use wikibot::{BotPassword, SiteBuilder};

use crate::args::Args;
use crate::bot::{AddTextBot, Terminal};

mod args;
mod bot;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = Args::parse_from(args::normalize(std::env::args()));
    let mut prompt = Terminal::new();
    let options = args.options(&mut prompt)?;

    let factory = args.factory();
    if factory.is_empty() {
        bail!("No pages to work on, use -page, -cat, -ref, -links, -transcludes, -search or -start. See --help.");
    }

    let mut config = Config::load_from(&args.config)?;
    if let Some(family) = args.family.take() {
        config.family = family;
    }
    if let Some(lang) = args.lang.take() {
        config.lang = lang;
    }

    let builder = SiteBuilder::from_config(&config);
    let bot = match (&config.username, &config.password, &config.oauth_token) {
        (Some(user), Some(pass), _) => builder.password(BotPassword::new(user, pass)),
        (_, _, Some(token)) => builder.oauth(token),
        _ => bail!(
            "no credentials, set `username` and `password` or `oauth_token` in {}",
            args.config.display()
        ),
    }
    .build()
    .await?;
    info!("working on {bot}");

    let pages = factory
        .build(&bot)
        .ok_or_else(|| eyre!("no page generator"))?;
    AddTextBot::new(bot, options, prompt).run(pages).await?;
    Ok(())
}
