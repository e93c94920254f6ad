//! Catalog session: metadata, configuration, transport and the bounded
//! memoization caches shared by every reference built from it.

use crate::{
    cache::{BoundedCache, CacheStats},
    compose::{ComposedPath, compose_path},
    config::Config,
    error::Error,
    filter::{FilterNode, parse_filter_segment},
    location::Location,
    obs::{self, TraceEvent},
    reference::{Interface, Reference},
    source::ResolvedSource,
    transport::{Method, Request, Response, Transport},
};
use ermpath_schema::node::{Catalog, Table};
use serde_json::Value;
use std::{
    fmt::Write as _,
    sync::{Arc, Mutex, PoisonError},
};

///
/// Parser
///
/// Filter-segment parser memoized on the exact segment text.
///

#[derive(Debug)]
pub struct Parser {
    filters: Mutex<BoundedCache<String, FilterNode>>,
}

impl Parser {
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            filters: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    pub fn parse_filter(&self, segment: &str) -> Result<FilterNode, Error> {
        let (node, cached) = self
            .filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_try_insert(&segment.to_string(), || parse_filter_segment(segment))?;

        obs::record(TraceEvent::FilterParsed { cached });

        Ok(node)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }

    pub fn clear(&self) {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

///
/// Client
///

pub struct Client {
    service: String,
    catalog: Catalog,
    config: Config,
    transport: Arc<dyn Transport>,
    context: Option<Value>,
    parser: Parser,
    paths: Mutex<BoundedCache<String, ComposedPath>>,
}

impl Client {
    /// Session for `catalog` served under `service`
    /// (`https://host/ermrest`). The configuration is validated first.
    pub fn new(
        service: impl Into<String>,
        catalog: Catalog,
        transport: Arc<dyn Transport>,
        config: Config,
    ) -> Result<Self, Error> {
        config.validate()?;
        let capacity = config.cache_capacity;

        Ok(Self {
            service: service.into().trim_end_matches('/').to_string(),
            catalog,
            config,
            transport,
            context: None,
            parser: Parser::new(capacity),
            paths: Mutex::new(BoundedCache::new(capacity)),
        })
    }

    /// Client context sent with every request.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn parser(&self) -> &Parser {
        &self.parser
    }

    /// `<service>/catalog/<id>`
    #[must_use]
    pub fn catalog_uri(&self) -> String {
        format!("{}/catalog/{}", self.service, self.catalog.id())
    }

    /// Bind a location path of this catalog.
    pub fn reference(&self, path: &str) -> Result<Reference<'_>, Error> {
        let location = Location::from_path(self.catalog.id(), path)?;

        Reference::new(self, location)
    }

    pub fn parse_filter(&self, segment: &str) -> Result<FilterNode, Error> {
        self.parser.parse_filter(segment)
    }

    /// Compose `sources` rooted at `root`, memoized on the source set.
    pub fn compose(&self, root: &Table, sources: &[ResolvedSource]) -> Result<ComposedPath, Error> {
        let key = cache_key(root, sources);
        let (composed, _) = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_try_insert(&key, || compose_path(root, sources, &self.config))?;

        Ok(composed)
    }

    /// Hit and miss counts of the filter and path caches.
    #[must_use]
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        let paths = self
            .paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats();

        (self.parser.stats(), paths)
    }

    pub fn clear_caches(&self) {
        self.parser.clear();
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Issue `method` against a full request URI.
    pub(crate) async fn fetch(
        &self,
        method: Method,
        interface: Interface,
        uri: String,
    ) -> Result<Value, Error> {
        obs::record(TraceEvent::RequestIssued {
            interface,
            uri: uri.clone(),
        });

        self.send(Request::new(method, uri)).await
    }

    /// Send through the transport. Failures are traced and returned as-is.
    pub(crate) async fn send(&self, request: Request) -> Result<Value, Error> {
        let request = match &self.context {
            Some(context) => request.with_context(context),
            None => request,
        };

        let result = self
            .transport
            .send(request)
            .await
            .and_then(Response::into_body);
        if let Err(Error::Transport { status, .. }) = &result {
            obs::record(TraceEvent::RequestFailed { status: *status });
        }

        result
    }
}

// Every use counts toward alias promotion, so the key keeps duplicates
// and the sourcekeys behind each source.
fn cache_key(root: &Table, sources: &[ResolvedSource]) -> String {
    let mut parts: Vec<String> = sources
        .iter()
        .map(|source| {
            let mut part = source.canonical();
            for (key, len) in &source.prefixes {
                let _ = write!(part, "#{key}@{len}");
            }
            if let Some(key) = &source.key {
                let _ = write!(part, "#={key}");
            }
            part
        })
        .collect();
    parts.sort_unstable();

    format!("{}\n{}", root.qualified_name(), parts.join("\n"))
}

///
/// TESTS
///
