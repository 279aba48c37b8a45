use chrono::{DateTime, NaiveDateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wikibot::req::{CategoryMembersGenerator, Edit, Generator, Limit, Main, Query, QueryPropRevisions, Request};
use wikibot::types::MwTimestamp;
use wikibot::SiteBuilder;

fn edit() -> Main {
    Main::edit(Edit {
        title: "title".into(),
        text: "text ".repeat(100),
        summary: "summary".into(),
        minor: true,
        bot: true,
        basetimestamp: Some(MwTimestamp(DateTime::from_utc(
            NaiveDateTime::from_timestamp_opt(0, 0).unwrap(),
            Utc,
        ))),
        nocreate: true,
        token: "token+\\".into(),
        ..Default::default()
    })
}

fn generator_query() -> Main {
    Main::query(Query {
        revisions: Some(QueryPropRevisions::latest_content()),
        generator: Some(Generator::CategoryMembers(CategoryMembersGenerator {
            title: "Category:Foo".into(),
            namespace: vec![0, 1, 14],
            limit: Some(Limit::Max),
        })),
        curtimestamp: true,
        ..Default::default()
    })
}

fn encode_bench(c: &mut Criterion) {
    let site = SiteBuilder::enwiki().build().unwrap();
    c.benchmark_group("encode_params")
        .bench_function("edit", |bencher| {
            bencher.iter(|| Request::from_params(&site, black_box(&edit())).http_params())
        })
        .bench_function("generator_query", |bencher| {
            bencher.iter(|| Request::from_params(&site, black_box(&generator_query())).http_params())
        })
        .bench_function("cache_key", |bencher| {
            let req = site.cached_request(
                chrono::Duration::days(1),
                [("action", "query"), ("meta", "siteinfo"), ("siprop", "namespaces|namespacealiases")],
            );
            bencher.iter(|| black_box(&req).cache_path())
        });
}

criterion_group!(benches, encode_bench);
criterion_main!(benches);
