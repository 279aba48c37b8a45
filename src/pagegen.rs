//! Page selection as bots take it from the command line: `-page:Foo`,
//! `-cat:Bar`, `-ns:0` and so on.

use std::collections::HashSet;
use std::future;
use std::pin::Pin;

use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::generators::{PageGenerator, WikiGenerator};
use crate::page::{Namespace, Namespaces, Page};
use crate::req::{
    AllPagesGenerator, BackLinksGenerator, CategoryMembersGenerator, EmbeddedInGenerator,
    Generator, Limit, LinksGenerator, Query, SearchGenerator,
};
use crate::sealed::Access;
use crate::{Error, Result, Site};

pub type PageStream = Pin<Box<dyn Stream<Item = Result<Page>> + Send>>;

#[derive(Clone, Debug, Default)]
pub struct GeneratorFactory {
    pages: Vec<String>,
    categories: Vec<String>,
    links: Vec<String>,
    references: Vec<String>,
    transclusions: Vec<String>,
    searches: Vec<String>,
    start: Option<String>,
    namespaces: Vec<i64>,
    limit: Option<i64>,
    talk_pages: bool,
}

impl GeneratorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `-page`
    pub fn page(mut self, title: impl Into<String>) -> Self {
        self.pages.push(title.into());
        self
    }

    /// `-cat`, members of a category.
    pub fn category(mut self, title: impl Into<String>) -> Self {
        self.categories.push(title.into());
        self
    }

    /// `-links`, pages linked from a page.
    pub fn links(mut self, title: impl Into<String>) -> Self {
        self.links.push(title.into());
        self
    }

    /// `-ref`, pages linking to a page.
    pub fn references(mut self, title: impl Into<String>) -> Self {
        self.references.push(title.into());
        self
    }

    /// `-transcludes`, pages using a template.
    pub fn transcludes(mut self, template: impl Into<String>) -> Self {
        self.transclusions.push(template.into());
        self
    }

    /// `-search`
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.searches.push(query.into());
        self
    }

    /// `-start`, all pages from the given title on.
    pub fn start(mut self, title: impl Into<String>) -> Self {
        self.start = Some(title.into());
        self
    }

    /// `-ns`
    pub fn namespaces(mut self, ns: impl IntoIterator<Item = i64>) -> Self {
        self.namespaces.extend(ns);
        self
    }

    /// `-limit`, zero or less is no limit.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Yield the talk page of each subject page instead.
    pub fn talk_pages(mut self, yes: bool) -> Self {
        self.talk_pages = yes;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
            && self.categories.is_empty()
            && self.links.is_empty()
            && self.references.is_empty()
            && self.transclusions.is_empty()
            && self.searches.is_empty()
            && self.start.is_none()
    }

    fn generators(&self) -> Vec<(Vec<String>, Generator)> {
        let ns = &self.namespaces;
        let limit = Some(Limit::Max);
        let mut gens = Vec::new();
        for c in &self.categories {
            gens.push((
                vec![],
                Generator::CategoryMembers(CategoryMembersGenerator {
                    title: c.clone(),
                    namespace: ns.clone(),
                    limit,
                }),
            ));
        }
        for l in &self.links {
            gens.push((
                vec![l.clone()],
                Generator::Links(LinksGenerator {
                    namespace: ns.clone(),
                    limit,
                }),
            ));
        }
        for r in &self.references {
            gens.push((
                vec![],
                Generator::BackLinks(BackLinksGenerator {
                    title: r.clone(),
                    namespace: ns.clone(),
                    limit,
                }),
            ));
        }
        for t in &self.transclusions {
            gens.push((
                vec![],
                Generator::EmbeddedIn(EmbeddedInGenerator {
                    title: t.clone(),
                    namespace: ns.clone(),
                    limit,
                }),
            ));
        }
        for s in &self.searches {
            gens.push((
                vec![],
                Generator::Search(SearchGenerator {
                    search: s.clone(),
                    namespace: ns.clone(),
                    limit,
                }),
            ));
        }
        if let Some(from) = &self.start {
            gens.push((
                vec![],
                Generator::AllPages(AllPagesGenerator {
                    from: Some(from.clone()),
                    namespace: ns.first().copied().or(Some(Namespace::MAIN)),
                    limit,
                }),
            ));
        }
        gens
    }

    /// All sources chained, each page once. `None` without any source.
    pub fn build<A: Access>(self, site: &Site<A>) -> Option<PageStream> {
        if self.is_empty() {
            return None;
        }
        let limit = self.limit.filter(|n| *n > 0);
        let mut sources: Vec<PageStream> = Vec::new();
        if !self.pages.is_empty() {
            let pages: Vec<_> = self.pages.iter().map(|t| Ok(Page::new(t.as_str()))).collect();
            sources.push(Box::pin(stream::iter(pages)));
        }
        for (titles, generator) in self.generators() {
            debug!(?generator, "adding generator");
            let source: PageStream = match namespace_of(&generator) {
                // the title names a namespace the site has to be asked about
                Some(ns) => {
                    let site = site.clone();
                    Box::pin(
                        stream::once(async move {
                            let namespaces = site.namespaces().await?;
                            let generator = qualify(generator, ns, &namespaces);
                            Ok::<_, Error>(generator_stream(&site, titles, generator, limit))
                        })
                        .try_flatten(),
                    )
                }
                None => generator_stream(site, titles, generator, limit),
            };
            sources.push(source);
        }

        let mut pages: PageStream = Box::pin(stream::iter(sources).flatten());
        if self.talk_pages {
            let site = site.clone();
            pages = Box::pin(pages.try_filter_map(move |page| {
                let site = site.clone();
                async move { talk_page(&site, page).await }
            }));
        }
        let mut seen = HashSet::new();
        pages = Box::pin(pages.filter(move |p| {
            future::ready(match p {
                Ok(p) => seen.insert(p.title.clone()),
                Err(_) => true,
            })
        }));
        if let Some(n) = limit {
            pages = Box::pin(pages.take(usize::try_from(n).unwrap_or(usize::MAX)));
        }
        Some(pages)
    }
}

/// The namespace the title of a generator is in.
fn namespace_of(generator: &Generator) -> Option<i64> {
    match generator {
        Generator::CategoryMembers(_) => Some(Namespace::CATEGORY),
        Generator::EmbeddedIn(_) => Some(Namespace::TEMPLATE),
        _ => None,
    }
}

fn qualify(generator: Generator, ns: i64, namespaces: &Namespaces) -> Generator {
    match generator {
        Generator::CategoryMembers(mut g) => {
            g.title = namespaces.in_namespace(ns, &g.title);
            Generator::CategoryMembers(g)
        }
        Generator::EmbeddedIn(mut g) => {
            g.title = namespaces.in_namespace(ns, &g.title);
            Generator::EmbeddedIn(g)
        }
        g => g,
    }
}

fn generator_stream<A: Access>(
    site: &Site<A>,
    titles: Vec<String>,
    generator: Generator,
    limit: Option<i64>,
) -> PageStream {
    let mut gen = PageGenerator::from_query(
        site,
        Query {
            titles,
            generator: Some(generator),
            ..Default::default()
        },
    );
    if let Some(n) = limit {
        gen.set_maximum_items(n);
    }
    Box::pin(gen.into_stream())
}

/// Talk pages pass through, subject pages become their talk pages and
/// special pages are dropped.
async fn talk_page<A: Access>(site: &Site<A>, page: Page) -> Result<Option<Page>> {
    let namespaces = site.namespaces().await?;
    let (ns, _) = namespaces.resolve(&page.title);
    if ns >= 0 && ns % 2 == 1 {
        return Ok(Some(page.with_namespace(ns)));
    }
    Ok(namespaces
        .talk_title(&page.title)
        .map(|(ns, title)| Page::new(title).with_namespace(ns)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        assert!(GeneratorFactory::new().namespaces([0]).limit(5).is_empty());
        assert!(!GeneratorFactory::new().page("Foo").is_empty());
        assert!(!GeneratorFactory::new().start("!").is_empty());
    }
}
