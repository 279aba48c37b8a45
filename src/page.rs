use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::res::PageResponse;
use crate::types::MwTimestamp;
use crate::{Error, Result};

/// A page and, once loaded, its latest revision.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub title: String,
    pub ns: i64,
    pub page_id: Option<u64>,
    pub missing: bool,
    pub redirect: bool,
    pub latest_revision: Option<u64>,
    /// Timestamp of the loaded revision, sent back on save.
    pub base_timestamp: Option<MwTimestamp>,
    /// When the page was loaded.
    pub start_timestamp: Option<MwTimestamp>,
    pub text: Option<String>,
}

impl Page {
    /// A page that has not been loaded yet.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ns: 0,
            page_id: None,
            missing: false,
            redirect: false,
            latest_revision: None,
            base_timestamp: None,
            start_timestamp: None,
            text: None,
        }
    }

    pub fn with_namespace(mut self, ns: i64) -> Self {
        self.ns = ns;
        self
    }

    pub(crate) fn from_response(p: PageResponse) -> Self {
        let rev = p.revisions.first();
        Self {
            latest_revision: rev.and_then(|r| r.rev_id).or(p.last_rev_id),
            base_timestamp: rev.and_then(|r| r.timestamp),
            text: rev.and_then(|r| r.content()).map(str::to_owned),
            title: p.title,
            ns: p.ns,
            page_id: p.page_id,
            missing: p.missing || p.invalid,
            redirect: p.redirect,
            start_timestamp: None,
        }
    }

    pub fn exists(&self) -> bool {
        !self.missing
    }

    pub fn is_loaded(&self) -> bool {
        self.text.is_some() || self.missing
    }

    pub fn is_talk_page(&self) -> bool {
        self.ns >= 0 && self.ns % 2 == 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub id: i64,
    /// The local name, empty for the main namespace.
    pub name: String,
    pub canonical: Option<String>,
    pub aliases: Vec<String>,
}

impl Namespace {
    pub const MAIN: i64 = 0;
    pub const USER_TALK: i64 = 3;
    pub const TEMPLATE: i64 = 10;
    pub const CATEGORY: i64 = 14;

    /// Every name the namespace can be written as.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.canonical.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|n| !n.is_empty())
    }
}

#[derive(Deserialize)]
struct NamespaceResponse {
    id: i64,
    #[serde(default, alias = "*")]
    name: String,
    canonical: Option<String>,
}

#[derive(Deserialize)]
struct AliasResponse {
    id: i64,
    #[serde(alias = "*")]
    alias: String,
}

/// The namespaces of a wiki, from `meta=siteinfo`.
#[derive(Clone, Debug, Default)]
pub struct Namespaces {
    by_id: BTreeMap<i64, Namespace>,
}

fn normalize(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

impl Namespaces {
    pub fn from_siteinfo(res: &Value) -> Result<Self> {
        let query = res.get("query").ok_or_else(|| Error::MediaWiki {
            code: "unexpectedresponse".into(),
            info: "siteinfo response has no query".into(),
        })?;
        let mut by_id = BTreeMap::new();
        if let Some(Value::Object(nss)) = query.get("namespaces") {
            for ns in nss.values() {
                let ns: NamespaceResponse = serde_json::from_value(ns.clone())?;
                by_id.insert(
                    ns.id,
                    Namespace {
                        id: ns.id,
                        name: ns.name,
                        canonical: ns.canonical,
                        aliases: Vec::new(),
                    },
                );
            }
        }
        if let Some(Value::Array(aliases)) = query.get("namespacealiases") {
            for a in aliases {
                let a: AliasResponse = serde_json::from_value(a.clone())?;
                if let Some(ns) = by_id.get_mut(&a.id) {
                    ns.aliases.push(a.alias);
                }
            }
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: i64) -> Option<&Namespace> {
        self.by_id.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.by_id.values()
    }

    /// Looks a namespace up by any of its names, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<&Namespace> {
        let name = normalize(name);
        if name.is_empty() {
            return self.get(Namespace::MAIN);
        }
        self.iter().find(|ns| ns.names().any(|n| normalize(n) == name))
    }

    /// Splits a title into its namespace and the rest.
    pub fn resolve<'a>(&self, title: &'a str) -> (i64, &'a str) {
        if let Some((prefix, rest)) = title.split_once(':') {
            if let Some(ns) = self.lookup(prefix) {
                if ns.id != Namespace::MAIN {
                    return (ns.id, rest.trim_start());
                }
            }
        }
        (Namespace::MAIN, title)
    }

    pub fn title(&self, ns: i64, rest: &str) -> String {
        match self.get(ns) {
            Some(n) if !n.name.is_empty() => format!("{}:{rest}", n.name),
            _ => rest.to_owned(),
        }
    }

    /// `title` in namespace `ns`, which it may already name by any alias.
    /// `Cat:Stubs` and `Stubs` both become `Category:Stubs`.
    pub fn in_namespace(&self, ns: i64, title: &str) -> String {
        match self.resolve(title) {
            (found, rest) if found == ns => self.title(ns, rest),
            _ => self.title(ns, title.trim()),
        }
    }

    /// The talk page of a subject page and the other way around. `None` for
    /// namespaces without talk pages.
    pub fn talk_title(&self, title: &str) -> Option<(i64, String)> {
        let (ns, rest) = self.resolve(title);
        if ns < 0 {
            return None;
        }
        let other = if ns % 2 == 0 { ns + 1 } else { ns - 1 };
        self.get(other)?;
        Some((other, self.title(other, rest)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    pub(crate) fn siteinfo() -> Value {
        json!({
            "batchcomplete": true,
            "query": {
                "namespaces": {
                    "-2": { "id": -2, "name": "Media", "canonical": "Media" },
                    "-1": { "id": -1, "name": "Special", "canonical": "Special" },
                    "0": { "id": 0, "name": "", "content": true },
                    "1": { "id": 1, "name": "Talk", "canonical": "Talk" },
                    "2": { "id": 2, "name": "User", "canonical": "User" },
                    "3": { "id": 3, "name": "User talk", "canonical": "User talk" },
                    "4": { "id": 4, "name": "Wikipedia", "canonical": "Project" },
                    "5": { "id": 5, "name": "Wikipedia talk", "canonical": "Project talk" },
                    "10": { "id": 10, "name": "Template", "canonical": "Template" },
                    "11": { "id": 11, "name": "Template talk", "canonical": "Template talk" },
                    "14": { "id": 14, "name": "Category", "canonical": "Category" },
                    "15": { "id": 15, "name": "Category talk", "canonical": "Category talk" },
                },
                "namespacealiases": [
                    { "id": 4, "alias": "WP" },
                    { "id": 14, "alias": "Cat" },
                ],
            }
        })
    }

    #[test]
    fn resolve() {
        let ns = Namespaces::from_siteinfo(&siteinfo()).unwrap();
        assert_eq!(ns.resolve("Foo"), (0, "Foo"));
        assert_eq!(ns.resolve("user_talk:Foo"), (3, "Foo"));
        assert_eq!(ns.resolve("WP:Sandbox"), (4, "Sandbox"));
        assert_eq!(ns.resolve("Project:Sandbox"), (4, "Sandbox"));
        assert_eq!(ns.resolve("Not a namespace: really"), (0, "Not a namespace: really"));
        assert_eq!(ns.get(14).unwrap().aliases, ["Cat"]);
    }

    #[test]
    fn talk_titles() {
        let ns = Namespaces::from_siteinfo(&siteinfo()).unwrap();
        assert_eq!(ns.talk_title("Foo"), Some((1, "Talk:Foo".into())));
        assert_eq!(ns.talk_title("Talk:Foo"), Some((0, "Foo".into())));
        assert_eq!(ns.talk_title("User:Bar"), Some((3, "User talk:Bar".into())));
        assert_eq!(ns.talk_title("Special:Random"), None);
    }

    #[test]
    fn in_namespace() {
        let ns = Namespaces::from_siteinfo(&siteinfo()).unwrap();
        assert_eq!(ns.in_namespace(14, "Stubs"), "Category:Stubs");
        assert_eq!(ns.in_namespace(14, "Cat:Stubs"), "Category:Stubs");
        assert_eq!(ns.in_namespace(14, "category:Stubs"), "Category:Stubs");
        assert_eq!(ns.in_namespace(10, "Infobox"), "Template:Infobox");
        assert_eq!(ns.in_namespace(10, "WP:Foo"), "Template:WP:Foo");
    }

    #[test]
    fn talk_pages() {
        assert!(Page::new("User talk:X").with_namespace(3).is_talk_page());
        assert!(!Page::new("X").is_talk_page());
        assert!(!Page::new("Special:X").with_namespace(-1).is_talk_page());
    }
}
