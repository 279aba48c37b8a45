use mwproc::Params;

use super::Limit;
use crate::url::NamedEnum;

/// Parameter prefixes of the query modules that work as generators.
const MODULE_PREFIXES: &[(&str, &str)] = &[
    ("allcategories", "ac"),
    ("allimages", "ai"),
    ("alllinks", "al"),
    ("allpages", "ap"),
    ("allredirects", "ar"),
    ("alltransclusions", "at"),
    ("backlinks", "bl"),
    ("categories", "cl"),
    ("categorymembers", "cm"),
    ("embeddedin", "ei"),
    ("exturlusage", "eu"),
    ("fileusage", "fu"),
    ("images", "im"),
    ("imageusage", "iu"),
    ("links", "pl"),
    ("linkshere", "lh"),
    ("prefixsearch", "ps"),
    ("querypage", "qp"),
    ("random", "rn"),
    ("recentchanges", "rc"),
    ("redirects", "rd"),
    ("search", "sr"),
    ("templates", "tl"),
    ("transcludedin", "ti"),
    ("watchlistraw", "wr"),
];

/// The parameter prefix of a query module, `cm` for `categorymembers`.
pub fn module_prefix(module: &str) -> Option<&'static str> {
    MODULE_PREFIXES
        .iter()
        .find(|(m, _)| *m == module)
        .map(|(_, p)| *p)
}

/// The limit parameter of a module used as a generator, `gcmlimit`.
pub fn generator_limit_param(module: &str) -> Option<String> {
    module_prefix(module).map(|p| format!("g{p}limit"))
}

#[derive(Params, Clone, Debug)]
pub enum Generator {
    Links(LinksGenerator),
    CategoryMembers(CategoryMembersGenerator),
    Search(SearchGenerator),
    EmbeddedIn(EmbeddedInGenerator),
    BackLinks(BackLinksGenerator),
    AllPages(AllPagesGenerator),
}

impl Generator {
    pub fn limit_param(&self) -> Option<String> {
        generator_limit_param(self.variant_name())
    }
}

/// Pages linked from the pages in `titles`.
#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gpl")]
pub struct LinksGenerator {
    pub namespace: Vec<i64>,
    pub limit: Option<Limit>,
}

#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gcm")]
pub struct CategoryMembersGenerator {
    /// With the namespace, `Category:Foo`.
    pub title: String,
    pub namespace: Vec<i64>,
    pub limit: Option<Limit>,
}

#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gsr")]
pub struct SearchGenerator {
    pub search: String,
    pub namespace: Vec<i64>,
    pub limit: Option<Limit>,
}

/// Pages transcluding `title`.
#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gei")]
pub struct EmbeddedInGenerator {
    pub title: String,
    pub namespace: Vec<i64>,
    pub limit: Option<Limit>,
}

/// Pages linking to `title`.
#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gbl")]
pub struct BackLinksGenerator {
    pub title: String,
    pub namespace: Vec<i64>,
    pub limit: Option<Limit>,
}

#[derive(Params, Clone, Debug, Default)]
#[mw(prepend_all = "gap")]
pub struct AllPagesGenerator {
    pub from: Option<String>,
    pub namespace: Option<i64>,
    pub limit: Option<Limit>,
}
