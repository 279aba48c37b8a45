use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use regex::Regex;
use wikibot::pagegen::GeneratorFactory;

use crate::bot::{Options, Prompt};

/// Adds text to the top or bottom of pages.
///
/// By default the text goes to the bottom, above the categories and
/// interlanguage links. Options are given as `-name:value`.
#[derive(Parser, Debug)]
#[command(name = "add_text", version, about, long_about = None)]
pub struct Args {
    /// Text to add. "\n" is interpreted as a newline.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub text: Option<String>,

    /// File which contains the text to add.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub textfile: Option<String>,

    /// Edit summary to use.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub summary: Option<String>,

    /// Put the text at the top of the page.
    #[arg(long)]
    pub up: bool,

    /// Put the text onto the talk page instead.
    #[arg(long, alias = "talk")]
    pub talkpage: bool,

    /// Don't ask before saving.
    #[arg(long)]
    pub always: bool,

    /// Append at the very bottom instead of above categories and interlanguage links.
    #[arg(long)]
    pub noreorder: bool,

    /// Skip pages whose rendered HTML matches this regex.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub excepturl: Option<String>,

    /// Skip pages whose text matches this regex.
    #[arg(long)]
    pub except: Option<String>,

    /// Create pages that don't exist.
    #[arg(long)]
    pub create: bool,

    /// Only create pages, skipping existing ones.
    #[arg(long)]
    pub createonly: bool,

    /// Save without the minor edit flag.
    #[arg(long)]
    pub major: bool,

    /// Work on this page.
    #[arg(long)]
    pub page: Vec<String>,

    /// Work on the members of this category.
    #[arg(long)]
    pub cat: Vec<String>,

    /// Work on the pages linked from this page.
    #[arg(long)]
    pub links: Vec<String>,

    /// Work on the pages linking to this page.
    #[arg(long = "ref")]
    pub references: Vec<String>,

    /// Work on the pages transcluding this template.
    #[arg(long)]
    pub transcludes: Vec<String>,

    /// Work on the results of this search.
    #[arg(long)]
    pub search: Vec<String>,

    /// Work on all pages from this title on.
    #[arg(long)]
    pub start: Option<String>,

    /// Only pages in these namespaces, by number.
    #[arg(long, value_delimiter = ',')]
    pub ns: Vec<i64>,

    /// Stop after this many pages.
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Family of the wiki, overriding the configuration.
    #[arg(long)]
    pub family: Option<String>,

    /// Language code of the wiki, overriding the configuration.
    #[arg(long)]
    pub lang: Option<String>,

    /// Configuration file.
    #[arg(long, default_value = wikibot::config::Config::FILE_NAME)]
    pub config: PathBuf,
}

/// `-text:foo` becomes `--text=foo` and `-up` becomes `--up`. Single
/// letter flags such as `-h` are left alone.
pub fn normalize<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    let mut args = args.into_iter();
    let mut out: Vec<String> = args.next().into_iter().collect();
    for arg in args {
        let normalized = match arg.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') && rest.len() > 1 => match rest.split_once(':') {
                Some((name, value)) => format!("--{}={value}", name.to_ascii_lowercase()),
                None => format!("--{}", rest.to_ascii_lowercase()),
            },
            _ => arg,
        };
        out.push(normalized);
    }
    out
}

const PROMPT_TEXT: &str = "What text do you want to add?";
const PROMPT_TEXTFILE: &str = "Which text file do you want to append to the page?";
const PROMPT_SUMMARY: &str = "What summary do you want to use?";
const PROMPT_EXCEPTURL: &str = "What url pattern should we skip?";

fn ask(value: Option<String>, question: &str, prompt: &mut impl Prompt) -> color_eyre::Result<Option<String>> {
    match value {
        Some(v) if v.is_empty() => Ok(Some(prompt.input(question)?)),
        v => Ok(v),
    }
}

fn regex(pattern: Option<String>, flag: &str) -> color_eyre::Result<Option<Regex>> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| Regex::new(&p).wrap_err_with(|| format!("invalid regex for -{flag}")))
        .transpose()
}

impl Args {
    /// Fills in prompted values and checks the options. Nothing here
    /// talks to the wiki.
    pub fn options(&mut self, prompt: &mut impl Prompt) -> color_eyre::Result<Options> {
        let text = ask(self.text.take(), PROMPT_TEXT, prompt)?.filter(|t| !t.is_empty());
        let textfile = ask(self.textfile.take(), PROMPT_TEXTFILE, prompt)?.filter(|t| !t.is_empty());
        let summary = ask(self.summary.take(), PROMPT_SUMMARY, prompt)?.filter(|s| !s.is_empty());
        let excepturl = ask(self.excepturl.take(), PROMPT_EXCEPTURL, prompt)?;

        let text = match (text, textfile) {
            (None, None) => bail!("Either the '-text' or '-textfile' is required"),
            (Some(_), Some(_)) => bail!("'-text' and '-textfile' cannot both be used"),
            (Some(text), None) => text.replace("\\n", "\n"),
            (None, Some(path)) => std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("could not read text file {path}"))?,
        };

        Ok(Options {
            summary: summary.unwrap_or_else(|| Options::default_summary(&text)),
            text,
            up: self.up,
            always: self.always,
            minor: !self.major,
            talk_page: self.talkpage,
            reorder: !self.noreorder,
            regex_skip_url: regex(excepturl, "excepturl")?,
            regex_skip: regex(self.except.take(), "except")?,
            create: self.create,
            createonly: self.createonly,
        })
    }

    pub fn factory(&self) -> GeneratorFactory {
        let mut f = GeneratorFactory::new();
        for p in &self.page {
            f = f.page(p.as_str());
        }
        for c in &self.cat {
            f = f.category(c.as_str());
        }
        for l in &self.links {
            f = f.links(l.as_str());
        }
        for r in &self.references {
            f = f.references(r.as_str());
        }
        for t in &self.transcludes {
            f = f.transcludes(t.as_str());
        }
        for s in &self.search {
            f = f.search(s.as_str());
        }
        if let Some(s) = &self.start {
            f = f.start(s.as_str());
        }
        if let Some(n) = self.limit {
            f = f.limit(n);
        }
        f.namespaces(self.ns.iter().copied())
            .talk_pages(self.talkpage)
    }
}
