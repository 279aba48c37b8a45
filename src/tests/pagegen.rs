use futures_util::TryStreamExt;
use serde_json::json;

use super::{page_json, site};
use crate::page::tests::siteinfo;
use crate::pagegen::GeneratorFactory;

#[tokio::test]
async fn nothing_selected() {
    let (site, _, _c) = site();
    assert!(GeneratorFactory::new().limit(3).build(&site).is_none());
}

#[tokio::test]
async fn duplicates_are_dropped() {
    let (site, mock, _c) = site();
    mock.push(siteinfo()).push(json!({
        "query": { "pages": [page_json("Foo"), page_json("Baz")] },
    }));
    let pages = GeneratorFactory::new()
        .page("Foo")
        .page("Foo")
        .category("Bar")
        .namespaces([0])
        .build(&site)
        .unwrap();
    let titles: Vec<_> = pages.map_ok(|p| p.title).try_collect().await.unwrap();
    assert_eq!(titles, ["Foo", "Baz"]);

    assert_eq!(mock.calls()[0].param("meta"), Some("siteinfo"));
    let call = &mock.calls()[1];
    assert_eq!(call.param("generator"), Some("categorymembers"));
    assert_eq!(call.param("gcmtitle"), Some("Category:Bar"));
    assert_eq!(call.param("gcmnamespace"), Some("0"));
    assert_eq!(call.param("gcmlimit"), Some("max"));
}

#[tokio::test]
async fn namespace_aliases_are_resolved() {
    let (site, mock, _c) = site();
    mock.push(siteinfo())
        .push(json!({ "query": { "pages": [page_json("Foo")] } }))
        .push(json!({ "query": { "pages": [page_json("Bar")] } }))
        .push(json!({ "query": { "pages": [page_json("Baz")] } }));
    let pages = GeneratorFactory::new()
        .category("Cat:Stubs")
        .category("category:Drafts")
        .transcludes("Infobox")
        .build(&site)
        .unwrap();
    let titles: Vec<_> = pages.map_ok(|p| p.title).try_collect().await.unwrap();
    assert_eq!(titles, ["Foo", "Bar", "Baz"]);

    let calls = mock.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[1].param("gcmtitle"), Some("Category:Stubs"));
    assert_eq!(calls[2].param("gcmtitle"), Some("Category:Drafts"));
    assert_eq!(calls[3].param("geititle"), Some("Template:Infobox"));
}

#[tokio::test]
async fn limit_applies_to_all_sources() {
    let (site, mock, _c) = site();
    let pages = GeneratorFactory::new()
        .page("A")
        .page("B")
        .page("C")
        .transcludes("Foo")
        .limit(2)
        .build(&site)
        .unwrap();
    let titles: Vec<_> = pages.map_ok(|p| p.title).try_collect().await.unwrap();
    assert_eq!(titles, ["A", "B"]);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn talk_pages() {
    let (site, mock, _c) = site();
    mock.push(siteinfo()).push(json!({
        "query": { "pages": [
            page_json("Foo"),
            { "ns": 1, "title": "Talk:Qux" },
            { "ns": -1, "title": "Special:Random" },
        ] },
    }));
    let pages = GeneratorFactory::new()
        .page("Foo")
        .page("User:Bar")
        .references("Baz")
        .talk_pages(true)
        .build(&site)
        .unwrap();
    let pages: Vec<_> = pages.try_collect().await.unwrap();
    let titles: Vec<_> = pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Talk:Foo", "User talk:Bar", "Talk:Qux"]);
    assert!(pages.iter().all(|p| p.is_talk_page()));
    assert_eq!(mock.calls()[1].param("gbltitle"), Some("Baz"));
}
