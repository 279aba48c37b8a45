use std::collections::VecDeque;
use std::future::Future;
use std::mem::take;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::{Map, Value};
use tracing::{trace, trace_span};

use crate::api::BoxFuture;
use crate::page::Page;
use crate::req::{self, Main, ParamValue, Query, Request};
use crate::sealed::Access;
use crate::{res, Error, Site};

/// The largest batch a limit parameter is set to.
pub const MAX_BATCH: usize = 500;

pub type ResponseFuture = BoxFuture<'static, crate::Result<Value>>;

#[pin_project::pin_project(project = StateProj)]
pub enum State<T> {
    Init,
    Fut(#[pin] ResponseFuture),
    Values(VecDeque<T>, Option<Map<String, Value>>),
    Cont(Map<String, Value>),
    Done,
}

impl<T> State<T> {
    pub fn values(v: VecDeque<T>, cont: Option<Map<String, Value>>) -> Self {
        if v.is_empty() {
            if let Some(c) = cont {
                Self::Cont(c)
            } else {
                Self::Done
            }
        } else {
            Self::Values(v, cont)
        }
    }
}

/// Follows the continuation of a query, yielding the items of each response
/// in order.
#[pin_project::pin_project]
pub struct GeneratorStream<G: WikiGenerator> {
    pub generator: G,
    #[pin]
    state: State<G::Item>,
    limit: Option<usize>,
    yielded: usize,
    span: tracing::span::Span,
}

impl<G: WikiGenerator> GeneratorStream<G> {
    /// `None` follows the query to its end.
    pub fn new(generator: G, limit: Option<usize>) -> Self {
        Self {
            generator,
            state: State::Init,
            limit,
            yielded: 0,
            span: trace_span!("stream"),
        }
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<G: WikiGenerator> Stream for GeneratorStream<G> {
    type Item = crate::Result<G::Item>;
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.as_mut().project();
        let entered = this.span.enter();
        macro_rules! tryit {
            ($e:expr) => {
                match $e {
                    Ok(very_well) => very_well,
                    Err(e) => {
                        this.state.set(State::Done);
                        return Poll::Ready(Some(Err(e)));
                    }
                }
            };
        }

        if this.limit.map_or(false, |l| *this.yielded >= l) {
            this.state.set(State::Done);
            return Poll::Ready(None);
        }

        let cont = match this.state.as_mut().project() {
            StateProj::Init => None,
            StateProj::Cont(c) => Some(take(c)),
            StateProj::Values(v, cont) => match v.pop_front() {
                Some(value) => {
                    *this.yielded += 1;
                    let state = State::values(take(v), take(cont));
                    this.state.set(state);
                    return Poll::Ready(Some(Ok(value)));
                }
                None => match take(cont) {
                    Some(c) => Some(c),
                    None => {
                        this.state.set(State::Done);
                        return Poll::Ready(None);
                    }
                },
            },
            StateProj::Fut(f) => match f.poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(res) => {
                    trace!("received response");
                    let mut res = tryit!(res);
                    let cont = crate::util::take_continue(&mut res);
                    let mut items: VecDeque<_> =
                        tryit!(this.generator.untangle_response(res)).into();
                    trace!(count = items.len(), more = cont.is_some(), "parsed response");
                    if let Some(item) = items.pop_front() {
                        *this.yielded += 1;
                        this.state.set(State::values(items, cont));
                        return Poll::Ready(Some(Ok(item)));
                    }
                    match cont {
                        // an empty batch that can be continued
                        Some(c) => Some(c),
                        None => {
                            this.state.set(State::Done);
                            return Poll::Ready(None);
                        }
                    }
                }
            },
            StateProj::Done => return Poll::Ready(None),
        };

        let mut req = this.generator.create_request();
        if let Some(c) = &cont {
            req.merge_continue(c);
        }
        if let (Some(param), Some(limit)) = (this.generator.limit_param(), *this.limit) {
            let remaining = limit - *this.yielded;
            req.set(param, remaining.min(MAX_BATCH));
        }
        trace!("sending request");
        let fut = Box::pin(req.submit());

        drop(entered);
        this.state.set(State::Fut(fut));

        self.poll_next(cx)
    }
}

pub trait WikiGenerator {
    type Item: 'static;
    /// The first request. Continuations are merged into a fresh copy of it.
    fn create_request(&self) -> Request;
    fn untangle_response(&self, res: Value) -> crate::Result<Vec<Self::Item>>;
    /// The parameter that caps the batch size, such as `gcmlimit`.
    fn limit_param(&self) -> Option<String> {
        None
    }
    /// How many items to yield at most.
    fn maximum_items(&self) -> Option<usize> {
        None
    }
    fn into_stream(self) -> GeneratorStream<Self>
    where
        Self: Sized,
    {
        let limit = self.maximum_items();
        GeneratorStream::new(self, limit)
    }
}

/// Pages from a query module used as `generator=`.
#[derive(Debug, Clone)]
pub struct PageGenerator {
    request: Request,
    limit_param: Option<String>,
    limit: Option<i64>,
}

impl PageGenerator {
    pub fn new<A, K, V>(
        site: &Site<A>,
        generator: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        A: Access,
        K: Into<String>,
        V: ParamValue,
    {
        let mut request = Request::new(site, [("action", "query"), ("generator", generator)]);
        for (k, v) in params {
            request.set(k, v);
        }
        Self {
            request,
            limit_param: req::generator_limit_param(generator),
            limit: None,
        }
    }

    /// A generator from a typed query. It must have `generator` set.
    pub fn from_query<A: Access>(site: &Site<A>, query: Query) -> Self {
        let limit_param = query.generator.as_ref().and_then(req::Generator::limit_param);
        Self {
            request: Request::from_params(site, &Main::query(query)),
            limit_param,
            limit: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The limit as it was set, which may be zero or negative.
    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    /// Yield at most `n` pages. `n <= 0` yields all of them.
    pub fn set_maximum_items(&mut self, n: i64) {
        self.limit = Some(n);
    }

    pub fn set_maximum_items_str(&mut self, n: &str) -> crate::Result<()> {
        let n = n
            .trim()
            .parse()
            .map_err(|_| Error::InvalidLimit(n.to_owned()))?;
        self.set_maximum_items(n);
        Ok(())
    }

    /// Also fetch the latest revision of each page, with its text.
    pub fn preload_content(mut self, preload: bool) -> Self {
        if preload {
            self.request.set("prop", ["revisions", "info"]);
            self.request.set("rvprop", ["ids", "timestamp", "content"]);
            self.request.set("rvslots", "main");
            self.request.set("curtimestamp", "");
        } else {
            for k in ["prop", "rvprop", "rvslots", "curtimestamp"] {
                self.request.remove(k);
            }
        }
        self
    }
}

impl WikiGenerator for PageGenerator {
    type Item = Page;

    fn create_request(&self) -> Request {
        self.request.clone()
    }

    fn untangle_response(&self, res: Value) -> crate::Result<Vec<Page>> {
        let start = res::curtimestamp(&res)?;
        let mut pages = res::pages(res)?;
        if pages.iter().all(|p| p.index.is_some()) {
            pages.sort_by_key(|p| p.index);
        }
        Ok(pages
            .into_iter()
            .map(|p| {
                let mut page = Page::from_response(p);
                if page.text.is_some() {
                    page.start_timestamp = start;
                }
                page
            })
            .collect())
    }

    fn limit_param(&self) -> Option<String> {
        self.limit_param.clone()
    }

    fn maximum_items(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0).map(|n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}

/// The raw items of a `list=` module.
#[derive(Debug, Clone)]
pub struct ListGenerator {
    request: Request,
    module: String,
    limit_param: Option<String>,
    limit: Option<usize>,
}

impl ListGenerator {
    pub fn new<A, K, V>(site: &Site<A>, list: &str, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        A: Access,
        K: Into<String>,
        V: ParamValue,
    {
        let mut request = Request::new(site, [("action", "query"), ("list", list)]);
        for (k, v) in params {
            request.set(k, v);
        }
        Self {
            request,
            module: list.to_owned(),
            limit_param: req::module_prefix(list).map(|p| format!("{p}limit")),
            limit: None,
        }
    }

    pub fn set_maximum_items(&mut self, n: i64) {
        self.limit = (n > 0).then(|| usize::try_from(n).unwrap_or(usize::MAX));
    }
}

impl WikiGenerator for ListGenerator {
    type Item = Value;

    fn create_request(&self) -> Request {
        self.request.clone()
    }

    fn untangle_response(&self, mut res: Value) -> crate::Result<Vec<Value>> {
        match res
            .get_mut("query")
            .and_then(|q| q.get_mut(&self.module))
            .map(Value::take)
        {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Object(items)) => Ok(items.into_iter().map(|(_, v)| v).collect()),
            _ => Ok(Vec::new()),
        }
    }

    fn limit_param(&self) -> Option<String> {
        self.limit_param.clone()
    }

    fn maximum_items(&self) -> Option<usize> {
        self.limit
    }
}
