use std::io;

use colored_diff::PrettyDifference;
use console::{style, Term};
use futures_util::{Stream, TryStreamExt};
use regex::Regex;
use tracing::{info, warn};
use wikibot::page::{Namespace, Page};
use wikibot::textlib::{self, LinkContext};
use wikibot::{Bot, EditOptions, Error};

/// Asks the operator.
pub trait Prompt {
    fn input(&mut self, question: &str) -> io::Result<String>;
    /// One of the keys of `options`, `default` on an empty answer.
    fn choice(&mut self, question: &str, options: &[(&str, char)], default: char) -> io::Result<char>;
}

pub struct Terminal {
    term: Term,
}

impl Terminal {
    pub fn new() -> Self {
        Self { term: Term::stdout() }
    }
}

impl Prompt for Terminal {
    fn input(&mut self, question: &str) -> io::Result<String> {
        self.term.write_line(&style(question).bold().to_string())?;
        Ok(self.term.read_line()?.trim().to_owned())
    }

    fn choice(&mut self, question: &str, options: &[(&str, char)], default: char) -> io::Result<char> {
        let keys = options
            .iter()
            .map(|(name, key)| {
                let key = if *key == default { key.to_ascii_uppercase() } else { *key };
                format!("{name} ({key})")
            })
            .collect::<Vec<_>>()
            .join(", ");
        loop {
            self.term.write_line(&format!("{} [{keys}]", style(question).bold()))?;
            let answer = self.term.read_line()?;
            let c = answer
                .trim()
                .chars()
                .next()
                .map_or(default, |c| c.to_ascii_lowercase());
            if options.iter().any(|(_, key)| *key == c) {
                return Ok(c);
            }
        }
    }
}

const CHOICES: &[(&str, char)] = &[
    ("Yes", 'y'),
    ("No", 'n'),
    ("All", 'a'),
    ("open in Browser", 'b'),
    ("Quit", 'q'),
];

#[derive(Debug, Clone)]
pub struct Options {
    pub text: String,
    pub summary: String,
    pub up: bool,
    pub always: bool,
    pub minor: bool,
    pub talk_page: bool,
    pub reorder: bool,
    pub regex_skip_url: Option<Regex>,
    pub regex_skip: Option<Regex>,
    pub create: bool,
    pub createonly: bool,
}

impl Options {
    /// `Bot: Adding ...` with the start of the text on one line.
    pub fn default_summary(text: &str) -> String {
        let start: String = text.chars().take(200).collect();
        format!("Bot: Adding {}", start.replace("\r\n", " - ").replace('\n', " - "))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub read: usize,
    pub written: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Saved,
    Skipped,
    Quit,
}

pub struct AddTextBot<P> {
    bot: Bot,
    opts: Options,
    prompt: P,
    links: Option<LinkContext>,
    counters: Counters,
}

impl<P: Prompt> AddTextBot<P> {
    pub fn new(bot: Bot, opts: Options, prompt: P) -> Self {
        Self {
            bot,
            opts,
            prompt,
            links: None,
            counters: Counters::default(),
        }
    }

    pub async fn run<S>(&mut self, mut pages: S) -> color_eyre::Result<Counters>
    where
        S: Stream<Item = wikibot::Result<Page>> + Unpin,
    {
        while let Some(page) = pages.try_next().await? {
            match self.process(page).await? {
                Outcome::Saved => self.counters.written += 1,
                Outcome::Skipped => self.counters.skipped += 1,
                Outcome::Quit => {
                    info!("User quit bot run.");
                    break;
                }
            }
        }
        let Counters { read, written, skipped } = self.counters;
        info!("{read} pages read, {written} pages written, {skipped} pages skipped");
        Ok(self.counters)
    }

    async fn process(&mut self, mut page: Page) -> color_eyre::Result<Outcome> {
        info!("Loading {}...", page.title);
        self.bot.load_page(&mut page).await?;
        self.counters.read += 1;

        if let Some(reason) = self.skip_reason(&page).await? {
            info!("Skipping {}: {reason}", page.title);
            return Ok(Outcome::Skipped);
        }

        let old = page.text.clone().unwrap_or_default();
        let new = self.treat(&old).await?;
        if new == old {
            info!("No changes were necessary in {}", page.title);
            return Ok(Outcome::Skipped);
        }

        println!("\n\n>>> {} <<<", style(&page.title).magenta().bold());
        println!("{}", PrettyDifference { expected: &old, actual: &new });

        loop {
            if !self.opts.always {
                match self.prompt.choice("Do you want to accept these changes?", CHOICES, 'n')? {
                    'a' => self.opts.always = true,
                    'n' => return Ok(Outcome::Skipped),
                    'q' => return Ok(Outcome::Quit),
                    'b' => {
                        println!("{}", self.bot.full_url(&page.title));
                        continue;
                    }
                    _ => {}
                }
            }
            return self.put(&page, &new).await;
        }
    }

    async fn skip_reason(&mut self, page: &Page) -> color_eyre::Result<Option<String>> {
        if page.exists() {
            if let Some(re) = &self.opts.regex_skip_url {
                let html = self.bot.fetch_html(&self.bot.full_url(&page.title)).await?;
                if let Some(m) = re.find(&html) {
                    return Ok(Some(format!("-excepturl matches {:?}", m.as_str())));
                }
            }
        }
        if let (Some(re), Some(text)) = (&self.opts.regex_skip, &page.text) {
            if let Some(m) = re.find(text) {
                return Ok(Some(format!("-except matches {:?}", m.as_str())));
            }
        }
        if !page.exists() {
            if page.is_talk_page() || self.opts.talk_page {
                info!("{} doesn't exist, creating it!", page.title);
                return Ok(None);
            }
            if !(self.opts.create || self.opts.createonly) {
                return Ok(Some("page doesn't exist".into()));
            }
            return Ok(None);
        }
        if self.opts.createonly {
            return Ok(Some("page already exists".into()));
        }
        if page.redirect {
            return Ok(Some("page is a redirect".into()));
        }
        Ok(None)
    }

    async fn treat(&mut self, text: &str) -> color_eyre::Result<String> {
        let add = &self.opts.text;
        if self.opts.up {
            return Ok(format!("{add}\n{text}"));
        }
        if !self.opts.reorder {
            return Ok(format!("{text}\n{add}"));
        }
        if self.links.is_none() {
            self.links = Some(LinkContext::for_site(&self.bot).await?);
        }
        Ok(self
            .links
            .as_ref()
            .map(|ctx| textlib::add_text(text, add, ctx))
            .unwrap_or_default())
    }

    async fn put(&mut self, page: &Page, text: &str) -> color_eyre::Result<Outcome> {
        let settings = self.bot.settings().clone();
        let options = EditOptions {
            summary: self.opts.summary.clone(),
            minor: self.opts.minor && page.ns != Namespace::USER_TALK,
            bot: true,
            createonly: !page.exists(),
            nocreate: page.exists(),
        };
        let mut count = 0;
        loop {
            let err = match self.bot.save(page, text, &options).await {
                Ok(res) => {
                    if res.nochange {
                        info!("No changes were needed on {}", page.title);
                    }
                    return Ok(Outcome::Saved);
                }
                Err(e) => e,
            };
            match err {
                e if e.is_transient() => {
                    if count > settings.max_retries {
                        return Err(color_eyre::eyre::eyre!(
                            "Server Error! Maximum retries exceeded: {e}"
                        ));
                    }
                    warn!("Server Error! Wait..");
                    tokio::time::sleep(settings.retry_wait).await;
                    count += 1;
                }
                Error::EditConflict { .. } => {
                    info!("Edit conflict! skip!");
                    return Ok(Outcome::Skipped);
                }
                Error::SpamBlacklist { title, url } => {
                    info!("Cannot change {title} because of blacklist entry {url}");
                    return Ok(Outcome::Skipped);
                }
                Error::LockedPage { title } => {
                    info!("Skipping {title} (locked page)");
                    return Ok(Outcome::Skipped);
                }
                e if e.is_save_related() => {
                    warn!("Error putting page: {e}");
                    return Ok(Outcome::Skipped);
                }
                e => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::stream;
    use serde_json::{json, Value};
    use wikibot::config::Settings;
    use wikibot::mock::MockTransport;
    use wikibot::{BotPassword, SiteBuilder};

    use super::*;

    struct Scripted(VecDeque<char>);

    impl Prompt for Scripted {
        fn input(&mut self, _: &str) -> io::Result<String> {
            Ok(String::new())
        }

        fn choice(&mut self, _: &str, _: &[(&str, char)], default: char) -> io::Result<char> {
            Ok(self.0.pop_front().unwrap_or(default))
        }
    }

    fn options(text: &str) -> Options {
        Options {
            text: text.into(),
            summary: Options::default_summary(text),
            up: false,
            always: true,
            minor: true,
            talk_page: false,
            reorder: true,
            regex_skip_url: None,
            regex_skip: None,
            create: false,
            createonly: false,
        }
    }

    fn siteinfo() -> Value {
        json!({
            "query": {
                "namespaces": {
                    "0": { "id": 0, "name": "" },
                    "1": { "id": 1, "name": "Talk", "canonical": "Talk" },
                    "3": { "id": 3, "name": "User talk", "canonical": "User talk" },
                    "14": { "id": 14, "name": "Category", "canonical": "Category" },
                },
                "namespacealiases": [],
            }
        })
    }

    fn loaded(title: &str, ns: i64, text: &str) -> Value {
        json!({
            "curtimestamp": "2022-01-03T03:07:00Z",
            "query": { "pages": [{
                "pageid": 7, "ns": ns, "title": title,
                "revisions": [{
                    "revid": 42,
                    "timestamp": "2022-01-01T00:00:00Z",
                    "slots": { "main": { "content": text } },
                }],
            }] },
        })
    }

    fn missing(title: &str, ns: i64) -> Value {
        json!({ "query": { "pages": [{ "ns": ns, "title": title, "missing": true }] } })
    }

    fn saved() -> Value {
        json!({ "edit": { "result": "Success", "newrevid": 43 } })
    }

    async fn bot(cache: &tempfile::TempDir) -> (Bot, Arc<MockTransport>) {
        let mock = MockTransport::new();
        mock.push_login("Example");
        let settings = Settings {
            max_retries: 2,
            retry_wait: Duration::ZERO,
            retry_max: Duration::ZERO,
            maxlag: None,
            put_throttle: Duration::ZERO,
            cache_dir: cache.path().to_owned(),
            siteinfo_expiry: wikibot::config::Config::default().settings().siteinfo_expiry,
        };
        let bot = SiteBuilder::enwiki()
            .settings(settings)
            .transport(mock.clone())
            .password(BotPassword::new("Example@bot", "hunter2"))
            .build()
            .await
            .unwrap();
        (bot, mock)
    }

    fn pages(titles: &[&str]) -> impl Stream<Item = wikibot::Result<Page>> + Unpin {
        stream::iter(titles.iter().map(|t| Ok(Page::new(*t))).collect::<Vec<_>>())
    }

    fn last_edit(mock: &MockTransport) -> wikibot::mock::Call {
        mock.calls()
            .into_iter()
            .filter(|c| c.param("action") == Some("edit"))
            .last()
            .unwrap()
    }

    #[test]
    fn summary() {
        assert_eq!(Options::default_summary("{{Foo}}"), "Bot: Adding {{Foo}}");
        assert_eq!(Options::default_summary("a\nb\r\nc"), "Bot: Adding a - b - c");
        let long = "x".repeat(300);
        assert_eq!(Options::default_summary(&long).len(), "Bot: Adding ".len() + 200);
    }

    #[tokio::test]
    async fn adds_above_categories() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("Foo", 0, "Foo\n[[Category:A]]"))
            .push(siteinfo())
            .push_csrf()
            .push(saved());
        let mut add = AddTextBot::new(bot, options("{{Stub}}"), Scripted(VecDeque::new()));
        let counters = add.run(pages(&["Foo"])).await.unwrap();
        assert_eq!(counters, Counters { read: 1, written: 1, skipped: 0 });

        let edit = last_edit(&mock);
        assert_eq!(edit.param("text"), Some("Foo\n{{Stub}}\n\n[[Category:A]]"));
        assert_eq!(edit.param("summary"), Some("Bot: Adding {{Stub}}"));
        assert_eq!(edit.param("minor"), Some(""));
        assert_eq!(edit.param("nocreate"), Some(""));
    }

    #[tokio::test]
    async fn up_and_noreorder() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("Foo", 0, "Foo\n[[Category:A]]"))
            .push_csrf()
            .push(saved())
            .push(loaded("Bar", 0, "Bar\n[[Category:A]]"))
            .push_csrf()
            .push(saved());
        let mut opts = options("{{Stub}}");
        opts.up = true;
        let mut add = AddTextBot::new(bot.clone(), opts, Scripted(VecDeque::new()));
        add.run(pages(&["Foo"])).await.unwrap();
        assert_eq!(last_edit(&mock).param("text"), Some("{{Stub}}\nFoo\n[[Category:A]]"));

        let mut opts = options("{{Stub}}");
        opts.reorder = false;
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        add.run(pages(&["Bar"])).await.unwrap();
        assert_eq!(last_edit(&mock).param("text"), Some("Bar\n[[Category:A]]\n{{Stub}}"));
    }

    #[tokio::test]
    async fn asks_before_saving() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("A", 0, "a"))
            .push(loaded("B", 0, "b"))
            .push_csrf()
            .push(saved())
            .push(loaded("C", 0, "c"))
            .push_csrf()
            .push(saved());
        let mut opts = options("x");
        opts.always = false;
        opts.reorder = false;
        // no for A, browser then all for B, C goes without asking
        let prompt = Scripted(VecDeque::from(['n', 'b', 'a']));
        let mut add = AddTextBot::new(bot, opts, prompt);
        let counters = add.run(pages(&["A", "B", "C"])).await.unwrap();
        assert_eq!(counters, Counters { read: 3, written: 2, skipped: 1 });
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn quit_stops_the_run() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("A", 0, "a"));
        let mut opts = options("x");
        opts.always = false;
        opts.reorder = false;
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::from(['q'])));
        let counters = add.run(pages(&["A", "B"])).await.unwrap();
        assert_eq!(counters.read, 1);
        assert_eq!(counters.written, 0);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn skips() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(missing("Missing", 0))
            .push(json!({ "query": { "pages": [{
                "pageid": 8, "ns": 0, "title": "Redirect", "redirect": true,
                "revisions": [{ "revid": 1, "slots": { "main": { "content": "#REDIRECT [[Foo]]" } } }],
            }] } }))
            .push(loaded("Excepted", 0, "has {{Stub}} already"))
            .push(loaded("Rendered", 0, "text"));
        mock.push_html("<p>plain</p>")
            .push_html("<p>plain</p>")
            .push_html("<div class='catlinks'></div>");
        let mut opts = options("{{Stub}}");
        opts.regex_skip = Some(Regex::new(r"\{\{[Ss]tub").unwrap());
        opts.regex_skip_url = Some(Regex::new("class='catlinks'").unwrap());
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        let counters = add
            .run(pages(&["Missing", "Redirect", "Excepted", "Rendered"]))
            .await
            .unwrap();
        assert_eq!(counters, Counters { read: 4, written: 0, skipped: 4 });
    }

    #[tokio::test]
    async fn creates_talk_pages() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(missing("User talk:Foo", 3))
            .push_csrf()
            .push(saved());
        let mut opts = options("Hello");
        opts.reorder = false;
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        let counters = add.run(pages(&["User talk:Foo"])).await.unwrap();
        assert_eq!(counters.written, 1);
        let edit = last_edit(&mock);
        assert_eq!(edit.param("text"), Some("\nHello"));
        assert_eq!(edit.param("createonly"), Some(""));
        // never minor on user talk pages
        assert_eq!(edit.param("minor"), None);
        assert_eq!(edit.param("notminor"), Some(""));
    }

    #[tokio::test]
    async fn createonly_skips_existing() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("Foo", 0, "x"));
        let mut opts = options("y");
        opts.createonly = true;
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        let counters = add.run(pages(&["Foo"])).await.unwrap();
        assert_eq!(counters.skipped, 1);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn save_errors_skip_the_page() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("A", 0, "a"))
            .push_csrf()
            .push(json!({ "error": { "code": "editconflict", "info": "conflict" } }))
            .push(loaded("B", 0, "b"))
            .push_csrf()
            .push(json!({ "error": { "code": "protectedpage", "info": "protected" } }))
            .push(loaded("C", 0, "c"))
            .push_csrf()
            .push(saved());
        let mut opts = options("x");
        opts.reorder = false;
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        let counters = add.run(pages(&["A", "B", "C"])).await.unwrap();
        assert_eq!(counters, Counters { read: 3, written: 1, skipped: 2 });
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("A", 0, "a"));
        for _ in 0..2 {
            mock.push_csrf()
                .push(json!({ "error": { "code": "readonly", "info": "locked" } }));
        }
        mock.push_csrf().push(saved());
        let mut opts = options("x");
        opts.reorder = false;
        let mut add = AddTextBot::new(bot.clone(), opts.clone(), Scripted(VecDeque::new()));
        assert_eq!(add.run(pages(&["A"])).await.unwrap().written, 1);

        mock.push(loaded("B", 0, "b"));
        for _ in 0..4 {
            mock.push_csrf()
                .push(json!({ "error": { "code": "readonly", "info": "locked" } }));
        }
        let mut add = AddTextBot::new(bot, opts, Scripted(VecDeque::new()));
        let err = add.run(pages(&["B"])).await.unwrap_err();
        assert!(err.to_string().contains("Maximum retries exceeded"));
    }

    #[tokio::test]
    async fn unchanged_text_is_skipped() {
        let cache = tempfile::tempdir().unwrap();
        let (bot, mock) = bot(&cache).await;
        mock.push(loaded("A", 0, "a\n")).push(siteinfo());
        let mut add = AddTextBot::new(bot, options(""), Scripted(VecDeque::new()));
        let counters = add.run(pages(&["A"])).await.unwrap();
        assert_eq!(counters, Counters { read: 1, written: 0, skipped: 1 });
        assert_eq!(mock.remaining(), 0);
    }
}
