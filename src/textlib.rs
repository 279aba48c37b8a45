//! Category and interlanguage links in wikitext.
//!
//! Only plain `[[Category:...]]` and `[[xx:...]]` links are recognized.
//! Links inside comments or `<nowiki>` are not told apart.

use regex::Regex;

use crate::page::{Namespace, Namespaces};
use crate::sealed::Access;
use crate::{Family, Result, Site};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryLink {
    pub title: String,
    pub sort_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageLink {
    pub code: String,
    pub title: String,
}

/// What a wiki calls its categories and which link prefixes are languages.
#[derive(Clone, Debug)]
pub struct LinkContext {
    category_ns: String,
    category: Regex,
    category_trailing: Regex,
    language: Regex,
    language_trailing: Regex,
}

/// `User talk` also matches `user_talk` and `User   talk`.
fn alternation<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut names: Vec<_> = names.collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    names
        .iter()
        .map(|n| regex::escape(n).replace(' ', "[ _]+"))
        .collect::<Vec<_>>()
        .join("|")
}

impl LinkContext {
    pub fn new(namespaces: &Namespaces, family: &Family) -> Result<Self> {
        let category = namespaces.get(Namespace::CATEGORY);
        let category_ns = category
            .map(|ns| ns.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Category".to_owned());
        let mut names: Vec<&str> = category.map(|ns| ns.names().collect()).unwrap_or_default();
        if !names.contains(&"Category") {
            names.push("Category");
        }
        let cats = alternation(names.into_iter());
        let langs = alternation(
            family
                .languages_by_size
                .iter()
                .chain(family.closed_wikis)
                .copied(),
        );

        let category = format!(r"(?i)\[\[\s*(?:{cats})\s*:\s*([^\[\]|\n]+?)\s*(?:\|([^\[\]\n]*))?\]\]");
        let language = format!(r"(?i)\[\[\s*({langs})\s*:\s*([^\[\]\n]*?)\s*\]\]");
        Ok(Self {
            category_ns,
            category_trailing: Regex::new(&format!(r"{category}\s*"))?,
            category: Regex::new(&category)?,
            language_trailing: Regex::new(&format!(r"{language}\s*"))?,
            language: Regex::new(&language)?,
        })
    }

    pub async fn for_site<A: Access>(site: &Site<A>) -> Result<Self> {
        Self::new(&*site.namespaces().await?, site.family())
    }

    pub fn category_links(&self, text: &str) -> Vec<CategoryLink> {
        self.category
            .captures_iter(text)
            .map(|c| CategoryLink {
                title: c[1].to_owned(),
                sort_key: c.get(2).map(|m| m.as_str().to_owned()),
            })
            .collect()
    }

    pub fn remove_category_links(&self, text: &str) -> String {
        self.category_trailing.replace_all(text, "").trim().to_owned()
    }

    pub fn format_category(&self, c: &CategoryLink) -> String {
        match &c.sort_key {
            Some(key) => format!("[[{}:{}|{key}]]", self.category_ns, c.title),
            None => format!("[[{}:{}]]", self.category_ns, c.title),
        }
    }

    /// Appends `categories` to the text, before any interlanguage links.
    /// Categories already in the text stay where they are.
    pub fn replace_category_links(&self, text: &str, categories: &[CategoryLink]) -> String {
        if categories.is_empty() {
            return text.to_owned();
        }
        let languages = self.language_links(text);
        let text = self.remove_language_links(text);
        let cats = categories
            .iter()
            .map(|c| self.format_category(c))
            .collect::<Vec<_>>()
            .join("\n");
        let text = format!("{}\n\n{cats}", text.trim_end());
        self.replace_language_links(&text, &languages)
    }

    pub fn language_links(&self, text: &str) -> Vec<LanguageLink> {
        self.language
            .captures_iter(text)
            .map(|c| LanguageLink {
                code: c[1].to_lowercase(),
                title: c[2].to_owned(),
            })
            .collect()
    }

    pub fn remove_language_links(&self, text: &str) -> String {
        self.language_trailing.replace_all(text, "").trim().to_owned()
    }

    /// Appends `links` at the end of the text.
    pub fn replace_language_links(&self, text: &str, links: &[LanguageLink]) -> String {
        if links.is_empty() {
            return text.to_owned();
        }
        let links = links
            .iter()
            .map(|l| format!("[[{}:{}]]", l.code, l.title))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\n{links}", text.trim_end())
    }
}

/// Adds `add` after the content of `text`, keeping categories and
/// interlanguage links at the bottom.
pub fn add_text(text: &str, add: &str, ctx: &LinkContext) -> String {
    let categories = ctx.category_links(text);
    let text = ctx.remove_category_links(text);
    let languages = ctx.language_links(&text);
    let mut text = ctx.remove_language_links(&text);
    text.push('\n');
    text.push_str(add);
    let text = ctx.replace_category_links(&text, &categories);
    ctx.replace_language_links(&text, &languages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::WIKIPEDIA;
    use crate::page::tests::siteinfo;

    fn ctx() -> LinkContext {
        let ns = Namespaces::from_siteinfo(&siteinfo()).unwrap();
        LinkContext::new(&ns, &WIKIPEDIA).unwrap()
    }

    #[test]
    fn categories() {
        let ctx = ctx();
        let text = "Foo\n[[Category:A]]\n[[category:B b|key]]\n[[Cat:C]] [[Categoryx:D]]";
        assert_eq!(
            ctx.category_links(text),
            [
                CategoryLink { title: "A".into(), sort_key: None },
                CategoryLink { title: "B b".into(), sort_key: Some("key".into()) },
                CategoryLink { title: "C".into(), sort_key: None },
            ]
        );
        assert_eq!(ctx.remove_category_links(text), "Foo\n[[Categoryx:D]]");
    }

    #[test]
    fn languages() {
        let ctx = ctx();
        let text = "Foo [[:de:Bar]]\n[[de:Bar]]\n[[zh-min-nan:Baz]]\n[[Talk:X]]";
        assert_eq!(
            ctx.language_links(text),
            [
                LanguageLink { code: "de".into(), title: "Bar".into() },
                LanguageLink { code: "zh-min-nan".into(), title: "Baz".into() },
            ]
        );
        assert_eq!(ctx.remove_language_links(text), "Foo [[:de:Bar]]\n[[Talk:X]]");
    }

    #[test]
    fn piped_language_links() {
        let ctx = ctx();
        let text = "Foo\n[[de:Bar|x]]";
        assert_eq!(
            ctx.language_links(text),
            [LanguageLink { code: "de".into(), title: "Bar|x".into() }]
        );
        assert_eq!(add_text(text, "{{Baz}}", &ctx), "Foo\n{{Baz}}\n\n[[de:Bar|x]]");
    }

    #[test]
    fn categories_go_before_languages() {
        let ctx = ctx();
        let cats = [CategoryLink { title: "A".into(), sort_key: None }];
        assert_eq!(
            ctx.replace_category_links("Foo\n[[de:Bar]]", &cats),
            "Foo\n\n[[Category:A]]\n\n[[de:Bar]]"
        );
        assert_eq!(ctx.replace_category_links("Foo", &[]), "Foo");
    }

    #[test]
    fn add() {
        let ctx = ctx();
        assert_eq!(
            add_text("Foo\n[[Category:A]]\n[[de:Bar]]", "{{Baz}}", &ctx),
            "Foo\n{{Baz}}\n\n[[Category:A]]\n\n[[de:Bar]]"
        );
        assert_eq!(add_text("Foo", "{{Baz}}", &ctx), "Foo\n{{Baz}}");
        assert_eq!(
            add_text("Foo\n\n[[Category:A|k]]\n", "x", &ctx),
            "Foo\nx\n\n[[Category:A|k]]"
        );
    }
}
