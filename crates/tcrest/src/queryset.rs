//! Lazy, filterable query sets.
//!
//! A [`QuerySet`] accumulates filter predicates without touching the network.
//! The first operation that needs data (`count`, `iter`, `nth`, ...) runs one
//! full pagination pass and caches the merged result; every later operation
//! on the same instance reuses it.
//!
//! ```ignore
//! use tcrest::{TeamCity, resources::BuildTypeFilter};
//!
//! let tc = TeamCity::builder("https://tc.example.com").path_prefix("/guestAuth").build()?;
//! let mut build_types = tc
//!     .build_types()
//!     .all()
//!     .filter(BuildTypeFilter::default().project_id("Foo"));
//!
//! println!("{} build types", build_types.len().await?);
//! for bt in build_types.iter().await? {
//!     println!("{} {}", bt.id, bt.name.unwrap_or_default());
//! }
//! ```

use std::marker::PhantomData;

use serde_json::Value;

use crate::Record;
use crate::error::{Error, Result};
use crate::locator::{Locator, LocatorValue};
use crate::pagination::{ListSummary, MergedResult, PageToken, accumulate};
use crate::resources::{Criteria, Origin, Resource};
use crate::session::TeamCity;

/// Options for [`QuerySet::get_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Run a list-mode count under the same filter first and fail with
    /// [`Error::MultipleResults`] if more than one record matches.
    pub raise_if_multiple: bool,
}

impl GetOptions {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            raise_if_multiple: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Cached {
    List(MergedResult),
    Detail(Record),
}

/// A lazily evaluated collection of `R` records.
///
/// Not meant to be shared between tasks: filters and the cache are mutated in
/// place. Take a fresh instance from [`crate::Manager::all`] instead.
pub struct QuerySet<R: Resource> {
    session: TeamCity,
    locator: Locator,
    cache: Option<Cached>,
    summary: ListSummary,
    url: Option<String>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> std::fmt::Debug for QuerySet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("path", &R::PATH)
            .field("locator", &self.locator.render())
            .field("cached", &self.cache.is_some())
            .field("url", &self.url)
            .finish()
    }
}

impl<R: Resource> QuerySet<R> {
    /// An unfiltered, unfetched query set.
    pub fn new(session: TeamCity) -> Self {
        Self {
            session,
            locator: Locator::new(),
            cache: None,
            summary: ListSummary::default(),
            url: None,
            _resource: PhantomData,
        }
    }

    /// A query set whose list data is already known, e.g. a collection
    /// embedded in a parent record. No request is made until the cache is
    /// discarded by [`QuerySet::get`].
    pub fn with_cached(session: TeamCity, merged: MergedResult) -> Self {
        let mut query_set = Self::new(session);
        query_set.summary = merged.summary();
        query_set.cache = Some(Cached::List(merged));
        query_set
    }

    /// Add the criteria's predicates.
    ///
    /// Repeated calls accumulate predicates rather than replacing them.
    /// Filtering after data has been cached does not refetch; only
    /// [`QuerySet::get`] discards the cache.
    #[must_use]
    pub fn filter(mut self, criteria: R::Filter) -> Self {
        criteria.apply(&mut self.locator);
        self
    }

    /// Add a raw predicate that has no typed criterion.
    #[must_use]
    pub fn predicate(mut self, name: impl Into<String>, value: impl Into<LocatorValue>) -> Self {
        self.locator.add(name, value);
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn session(&self) -> &TeamCity {
        &self.session
    }

    /// The resource root URL.
    pub fn base_url(&self) -> String {
        self.session.absolute_url(R::PATH)
    }

    /// `base` when unfiltered, otherwise `base?locator=<locator>`.
    pub fn resolve_list_url(&self) -> String {
        let base = self.base_url();
        if self.locator.is_empty() {
            base
        } else {
            format!("{}?locator={}", base, self.locator)
        }
    }

    /// `base<locator>`, addressing a single record by path.
    ///
    /// Fails when the locator is empty or uses a predicate that is not in
    /// [`Resource::DETAIL_KEYS`].
    pub fn resolve_detail_url(&self) -> Result<String> {
        if self.locator.is_empty() {
            return Err(Error::DetailLocator {
                locator: String::new(),
                reason: "no predicates to address a single record".to_string(),
            });
        }

        if let Some(name) = self.locator.names().find(|n| !R::DETAIL_KEYS.contains(n)) {
            return Err(Error::DetailLocator {
                locator: self.locator.render(),
                reason: format!(
                    "'{}' is not a single-record predicate for {}",
                    name,
                    R::PATH
                ),
            });
        }

        Ok(format!("{}{}", self.base_url(), self.locator))
    }

    /// URL of the last fetch, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether list data is cached.
    pub fn is_cached(&self) -> bool {
        matches!(self.cache, Some(Cached::List(_)))
    }

    /// Integer fields of the cached list data.
    pub fn summary(&self) -> &ListSummary {
        &self.summary
    }

    /// Fetch and merge every page of the list response.
    ///
    /// Does nothing when list data is already cached. On failure nothing is
    /// cached.
    pub async fn fetch_all(&mut self) -> Result<&mut Self> {
        if self.is_cached() {
            return Ok(self);
        }

        let first_url = self.resolve_list_url();
        let session = self.session.clone();
        let merged = accumulate(R::schema(), |token| {
            let session = session.clone();
            let url = match token {
                PageToken::First => first_url.clone(),
                PageToken::Next(href) => session.absolute_url(&href),
            };
            async move { session.get_json(&url).await }
        })
        .await?;

        let summary = merged.summary();
        tracing::debug!(
            url = %first_url,
            pages = merged.pages(),
            count = ?summary.count,
            "Fetched query set"
        );

        self.summary = summary;
        self.cache = Some(Cached::List(merged));
        self.url = Some(first_url);
        Ok(self)
    }

    /// Total number of matching records, from the merged `count` field.
    ///
    /// Defaults to 0 when the response has no `count`.
    pub async fn count(&mut self) -> Result<u64> {
        self.fetch_all().await?;
        Ok(self.summary.count.unwrap_or(0))
    }

    /// Alias of [`QuerySet::count`].
    pub async fn len(&mut self) -> Result<u64> {
        self.count().await
    }

    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Raw records of the collection field. Empty when the field is absent.
    pub async fn records(&mut self) -> Result<&[Value]> {
        self.fetch_all().await?;
        Ok(self.cached_records())
    }

    /// Materialize each cached record as it is iterated.
    ///
    /// Call again to restart from the first record.
    pub async fn iter(&mut self) -> Result<Iter<'_, R>> {
        self.fetch_all().await?;
        let origin = Origin::new(self.session.clone(), self.url.clone());
        Ok(Iter {
            records: self.cached_records().iter(),
            origin,
            _resource: PhantomData,
        })
    }

    /// The record at `index`.
    pub async fn nth(&mut self, index: usize) -> Result<R> {
        let mut iter = self.iter().await?;
        let len = iter.len();
        iter.nth(index).ok_or(Error::IndexOutOfRange { index, len })
    }

    /// Records `start, start + step, ...` below `stop` (or to the end).
    pub async fn slice(&mut self, start: usize, stop: Option<usize>, step: usize) -> Result<Vec<R>> {
        if step == 0 {
            return Err(Error::InvalidSlice);
        }

        let iter = self.iter().await?.skip(start);
        let items = match stop {
            Some(stop) => iter
                .take(stop.saturating_sub(start))
                .step_by(step)
                .collect(),
            None => iter.step_by(step).collect(),
        };
        Ok(items)
    }

    /// Fetch a single record with [`GetOptions::default`].
    pub async fn get(&mut self, criteria: R::Filter) -> Result<R> {
        self.get_with(criteria, GetOptions::default()).await
    }

    /// Apply `criteria`, discard cached data and fetch one record in detail
    /// mode.
    ///
    /// With [`GetOptions::raise_if_multiple`] a list-mode fetch under the same
    /// filter runs first; if it matches more than one record the call fails
    /// with [`Error::MultipleResults`] and no detail request is made. The
    /// detail locator is validated after that count, so list-only predicates
    /// still reach it. Without the option the locator is validated before any
    /// request.
    ///
    /// On failure the instance keeps the filters and cache it had before the
    /// call.
    pub async fn get_with(&mut self, criteria: R::Filter, options: GetOptions) -> Result<R> {
        let locator = self.locator.clone();
        let cache = self.cache.take();
        let summary = std::mem::take(&mut self.summary);
        let url = self.url.clone();
        criteria.apply(&mut self.locator);

        let fetched = self.fetch_detail(options).await;
        if fetched.is_err() {
            self.locator = locator;
            self.cache = cache;
            self.summary = summary;
            self.url = url;
        }
        fetched
    }

    /// Apply `criteria` and return the detail URL without fetching.
    ///
    /// A rejected locator leaves the instance's filters unchanged.
    pub fn get_url(&mut self, criteria: R::Filter) -> Result<String> {
        let locator = self.locator.clone();
        criteria.apply(&mut self.locator);
        let url = self.resolve_detail_url();
        if url.is_err() {
            self.locator = locator;
        }
        url
    }

    async fn fetch_detail(&mut self, options: GetOptions) -> Result<R> {
        if options.raise_if_multiple {
            let count = self.count().await?;
            if count > 1 {
                return Err(Error::MultipleResults { count });
            }
            self.cache = None;
            self.summary = ListSummary::default();
        }

        let url = self.resolve_detail_url()?;
        let record = self.session.get_json(&url).await?;
        self.url = Some(url.clone());
        self.cache = Some(Cached::Detail(record.clone()));

        Ok(R::from_record(
            record,
            Origin::new(self.session.clone(), Some(url)),
        ))
    }

    fn cached_records(&self) -> &[Value] {
        match &self.cache {
            Some(Cached::List(merged)) => merged.collection(R::COLLECTION),
            _ => &[],
        }
    }
}

/// Iterator over the entities of a fetched [`QuerySet`].
///
/// Records that are not JSON objects are skipped.
pub struct Iter<'a, R> {
    records: std::slice::Iter<'a, Value>,
    origin: Origin,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Iterator for Iter<'_, R> {
    type Item = R;

    fn next(&mut self) -> Option<R> {
        self.records
            .by_ref()
            .find_map(Value::as_object)
            .map(|record| R::from_record(record.clone(), self.origin.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.records.len()))
    }
}

impl<R: Resource> Iter<'_, R> {
    /// Records remaining, including any that will be skipped.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.len() == 0
    }
}
