//! Test occurrences and their detail view.
//!
//! Both resources share `/app/rest/testOccurrences/`. A [`TestOccurrence`] is
//! the light row returned when listing a build's tests; its composite id
//! (`id:<test>,build:(id:<build>)`) is split so that [`TestOccurrence::detail`]
//! can address the full [`TestOccurrenceDetail`] record.

use crate::Record;
use crate::error::Result;
use crate::locator::Locator;

use super::{Criteria, Origin, Resource, fields};

/// Filter criteria for listing test occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOccurrenceFilter {
    /// Rendered as `build:(id:<id>)`.
    pub build_id: Option<String>,
    pub status: Option<String>,
}

impl TestOccurrenceFilter {
    #[must_use]
    pub fn build_id(mut self, build_id: impl ToString) -> Self {
        self.build_id = Some(build_id.to_string());
        self
    }

    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl Criteria for TestOccurrenceFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(build_id) = &self.build_id {
            locator.add("build", Locator::by_id(build_id));
        }
        if let Some(status) = &self.status {
            locator.add("status", status);
        }
    }
}

/// Split a composite occurrence id into its first two digit runs.
fn split_composite_id(id: &str) -> (Option<String>, Option<String>) {
    let mut runs = id
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(str::to_string);
    (runs.next(), runs.next())
}

/// One test run within one build.
#[derive(Debug, Clone)]
pub struct TestOccurrence {
    /// The raw composite id, e.g. `id:200,build:(id:100)`.
    pub id: String,
    pub test_id: Option<String>,
    pub build_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    /// Milliseconds.
    pub duration: Option<i64>,
    pub href: Option<String>,
    record: Record,
    origin: Origin,
}

impl Resource for TestOccurrence {
    const PATH: &'static str = "/app/rest/testOccurrences/";
    const COLLECTION: &'static str = "testOccurrence";
    const DETAIL_KEYS: &'static [&'static str] = &["id", "build", "test", "name", "status"];

    type Filter = TestOccurrenceFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        let id = fields::text(&record, "id").unwrap_or_default();
        let (test_id, build_id) = split_composite_id(&id);
        Self {
            test_id,
            build_id,
            id,
            name: fields::text(&record, "name"),
            status: fields::text(&record, "status"),
            duration: fields::integer(&record, "duration"),
            href: fields::text(&record, "href"),
            record,
            origin,
        }
    }
}

impl TestOccurrence {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fetch the full occurrence record.
    pub async fn detail(&self) -> Result<TestOccurrenceDetail> {
        let mut filter = TestOccurrenceDetailFilter::default();
        if let Some(test_id) = &self.test_id {
            filter = filter.test_id(test_id);
        }
        if let Some(build_id) = &self.build_id {
            filter = filter.build_id(build_id);
        }
        self.origin.session().test_details().all().get(filter).await
    }
}

/// Filter criteria addressing one occurrence in detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestOccurrenceDetailFilter {
    pub test_id: Option<String>,
    /// Rendered as `build:(id:<id>)`.
    pub build_id: Option<String>,
}

impl TestOccurrenceDetailFilter {
    #[must_use]
    pub fn test_id(mut self, test_id: impl ToString) -> Self {
        self.test_id = Some(test_id.to_string());
        self
    }

    #[must_use]
    pub fn build_id(mut self, build_id: impl ToString) -> Self {
        self.build_id = Some(build_id.to_string());
        self
    }
}

impl Criteria for TestOccurrenceDetailFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(test_id) = &self.test_id {
            locator.add("id", test_id);
        }
        if let Some(build_id) = &self.build_id {
            locator.add("build", Locator::by_id(build_id));
        }
    }
}

/// The detail view of a test occurrence.
#[derive(Debug, Clone)]
pub struct TestOccurrenceDetail {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
    pub duration: Option<i64>,
    pub href: Option<String>,
    /// Failure output, when the test failed.
    pub details: Option<String>,
    pub ignored: Option<bool>,
    pub ignore_details: Option<String>,
    record: Record,
    origin: Origin,
}

impl Resource for TestOccurrenceDetail {
    const PATH: &'static str = "/app/rest/testOccurrences/";
    const COLLECTION: &'static str = "testOccurrence";
    const DETAIL_KEYS: &'static [&'static str] = &["id", "build"];

    type Filter = TestOccurrenceDetailFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        Self {
            id: fields::text(&record, "id").unwrap_or_default(),
            name: fields::text(&record, "name"),
            status: fields::text(&record, "status"),
            duration: fields::integer(&record, "duration"),
            href: fields::text(&record, "href"),
            details: fields::text(&record, "details"),
            ignored: fields::flag(&record, "ignored"),
            ignore_details: fields::text(&record, "ignoreDetails")
                .or_else(|| fields::text(&record, "ignore_details")),
            record,
            origin,
        }
    }
}

impl TestOccurrenceDetail {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The embedded test summary.
    pub fn test(&self) -> Option<&Record> {
        fields::object(&self.record, "test")
    }

    /// The embedded build summary.
    pub fn build(&self) -> Option<&Record> {
        fields::object(&self.record, "build")
    }
}
