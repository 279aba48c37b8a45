//! Shapes of API responses.

use serde::Deserialize;
use serde_json::Value;

use crate::types::MwTimestamp;
use crate::Result;

#[derive(Deserialize, Debug, Clone)]
pub struct PageResponse {
    #[serde(rename = "pageid")]
    pub page_id: Option<u64>,
    #[serde(default)]
    pub ns: i64,
    pub title: String,
    #[serde(default, deserialize_with = "crate::util::flag::deserialize")]
    pub missing: bool,
    #[serde(default, deserialize_with = "crate::util::flag::deserialize")]
    pub invalid: bool,
    #[serde(default, deserialize_with = "crate::util::flag::deserialize")]
    pub redirect: bool,
    #[serde(rename = "lastrevid")]
    pub last_rev_id: Option<u64>,
    #[serde(default)]
    pub revisions: Vec<RevisionResponse>,
    /// Position in the results of generators that rank, such as `search`.
    pub index: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RevisionResponse {
    #[serde(rename = "revid")]
    pub rev_id: Option<u64>,
    pub timestamp: Option<MwTimestamp>,
    pub slots: Option<Slots>,
    /// formatversion 1 without slots
    #[serde(rename = "*")]
    pub content: Option<String>,
}

impl RevisionResponse {
    pub fn content(&self) -> Option<&str> {
        self.slots
            .as_ref()
            .and_then(|s| s.main.content())
            .or(self.content.as_deref())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Slots {
    pub main: Slot,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Slot {
    pub content: Option<String>,
    #[serde(rename = "*")]
    pub legacy_content: Option<String>,
}

impl Slot {
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref().or(self.legacy_content.as_deref())
    }
}

/// `query.pages` of a response, either as an array (formatversion 2) or as
/// an object keyed by page id (formatversion 1). A response without pages
/// yields nothing.
pub fn pages(mut res: Value) -> Result<Vec<PageResponse>> {
    let pages = match res.get_mut("query").and_then(|q| q.get_mut("pages")) {
        Some(p) => p.take(),
        None => return Ok(Vec::new()),
    };
    let pages = match pages {
        Value::Array(a) => a,
        Value::Object(o) => o.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };
    pages
        .into_iter()
        .map(|p| Ok(serde_json::from_value(p)?))
        .collect()
}

pub fn curtimestamp(res: &Value) -> Result<Option<MwTimestamp>> {
    match res.get("curtimestamp") {
        Some(t) => Ok(Some(serde_json::from_value(t.clone())?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn both_formats() {
        let v2 = json!({ "query": { "pages": [
            { "pageid": 1, "ns": 0, "title": "A", "revisions": [
                { "revid": 10, "timestamp": "2022-01-03T03:07:00Z",
                  "slots": { "main": { "content": "hello" } } }
            ] },
            { "ns": 0, "title": "B", "missing": true },
        ] } });
        let p = pages(v2).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0].revisions[0].content(), Some("hello"));
        assert!(p[1].missing);
        assert_eq!(p[1].page_id, None);

        let v1 = json!({ "query": { "pages": {
            "-1": { "ns": 0, "title": "B", "missing": "" },
            "1": { "pageid": 1, "ns": 0, "title": "A", "redirect": "",
                   "revisions": [{ "revid": 10, "*": "hi" }] },
        } } });
        let p = pages(v1).unwrap();
        assert_eq!(p.len(), 2);
        let a = p.iter().find(|p| p.title == "A").unwrap();
        assert!(a.redirect);
        assert_eq!(a.revisions[0].content(), Some("hi"));
        assert!(p.iter().find(|p| p.title == "B").unwrap().missing);
    }

    #[test]
    fn no_pages() {
        assert!(pages(json!({ "batchcomplete": true })).unwrap().is_empty());
    }
}
