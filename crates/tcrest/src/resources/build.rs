//! Finished and running builds.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::Record;
use crate::error::Result;
use crate::locator::Locator;
use crate::queryset::QuerySet;

use super::build_type::{BuildType, BuildTypeFilter};
use super::parameter::{Parameter, parameters};
use super::test_occurrence::{TestOccurrence, TestOccurrenceFilter};
use super::{Criteria, Origin, Resource, fields};

/// Filter criteria for `/app/rest/builds/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFilter {
    pub id: Option<i64>,
    pub number: Option<String>,
    pub build_type: Option<String>,
    pub branch: Option<String>,
    pub status: Option<String>,
    pub state: Option<String>,
    pub user: Option<String>,
    /// Each tag becomes its own `tag:<name>` predicate.
    pub tags: Vec<String>,
    pub pinned: Option<bool>,
    pub running: Option<bool>,
    pub canceled: Option<bool>,
    pub agent_name: Option<String>,
    /// Rendered as `snapshotDependency:(to:(id:<id>),includeInitial:true)`.
    pub snapshot_dependency_of: Option<i64>,
    pub default_filter: Option<bool>,
    pub start: Option<u64>,
    pub count: Option<u64>,
    pub lookup_limit: Option<u64>,
}

impl BuildFilter {
    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    #[must_use]
    pub fn build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = Some(build_type.into());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    #[must_use]
    pub fn running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    #[must_use]
    pub fn canceled(mut self, canceled: bool) -> Self {
        self.canceled = Some(canceled);
        self
    }

    #[must_use]
    pub fn agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    #[must_use]
    pub fn snapshot_dependency_of(mut self, build_id: i64) -> Self {
        self.snapshot_dependency_of = Some(build_id);
        self
    }

    #[must_use]
    pub fn default_filter(mut self, default_filter: bool) -> Self {
        self.default_filter = Some(default_filter);
        self
    }

    #[must_use]
    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    #[must_use]
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn lookup_limit(mut self, lookup_limit: u64) -> Self {
        self.lookup_limit = Some(lookup_limit);
        self
    }
}

impl Criteria for BuildFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(id) = self.id {
            locator.add("id", id);
        }
        if let Some(number) = &self.number {
            locator.add("number", number);
        }
        if let Some(build_type) = &self.build_type {
            locator.add("buildType", build_type);
        }
        if let Some(branch) = &self.branch {
            locator.add("branch", branch);
        }
        if let Some(status) = &self.status {
            locator.add("status", status);
        }
        if let Some(state) = &self.state {
            locator.add("state", state);
        }
        if let Some(user) = &self.user {
            locator.add("user", user);
        }
        for tag in &self.tags {
            locator.add("tag", tag);
        }
        if let Some(pinned) = self.pinned {
            locator.add("pinned", pinned);
        }
        if let Some(running) = self.running {
            locator.add("running", running);
        }
        if let Some(canceled) = self.canceled {
            locator.add("canceled", canceled);
        }
        if let Some(agent_name) = &self.agent_name {
            locator.add("agentName", agent_name);
        }
        if let Some(build_id) = self.snapshot_dependency_of {
            locator.add(
                "snapshotDependency",
                Locator::new()
                    .with("to", Locator::by_id(build_id))
                    .with("includeInitial", true),
            );
        }
        if let Some(default_filter) = self.default_filter {
            locator.add("defaultFilter", default_filter);
        }
        if let Some(start) = self.start {
            locator.add("start", start);
        }
        if let Some(count) = self.count {
            locator.add("count", count);
        }
        if let Some(lookup_limit) = self.lookup_limit {
            locator.add("lookupLimit", lookup_limit);
        }
    }
}

/// A build, finished or running.
#[derive(Debug, Clone)]
pub struct Build {
    /// 0 when the record has no id.
    pub id: i64,
    pub number: Option<String>,
    pub build_type_id: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub status_text: Option<String>,
    pub branch_name: Option<String>,
    pub default_branch: Option<bool>,
    pub href: Option<String>,
    pub web_url: Option<String>,
    pub queued_date: Option<DateTime<FixedOffset>>,
    pub start_date: Option<DateTime<FixedOffset>>,
    pub finish_date: Option<DateTime<FixedOffset>>,
    record: Record,
    origin: Origin,
}

impl Resource for Build {
    const PATH: &'static str = "/app/rest/builds/";
    const COLLECTION: &'static str = "build";
    const DETAIL_KEYS: &'static [&'static str] = &[
        "id",
        "number",
        "buildType",
        "branch",
        "status",
        "state",
        "user",
        "tag",
        "pinned",
        "running",
        "canceled",
        "agentName",
    ];

    type Filter = BuildFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        Self {
            id: fields::integer(&record, "id").unwrap_or_default(),
            number: fields::text(&record, "number"),
            build_type_id: fields::text(&record, "buildTypeId"),
            state: fields::text(&record, "state"),
            status: fields::text(&record, "status"),
            status_text: fields::text(&record, "statusText"),
            branch_name: fields::text(&record, "branchName"),
            default_branch: fields::flag(&record, "defaultBranch"),
            href: fields::text(&record, "href"),
            web_url: fields::text(&record, "webUrl"),
            queued_date: fields::timestamp(&record, "queuedDate"),
            start_date: fields::timestamp(&record, "startDate"),
            finish_date: fields::timestamp(&record, "finishDate"),
            record,
            origin,
        }
    }
}

impl Build {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fetch the build configuration this build ran.
    pub async fn build_type(&self) -> Result<BuildType> {
        let filter = match &self.build_type_id {
            Some(build_type_id) => BuildTypeFilter::default().id(build_type_id),
            None => BuildTypeFilter::default(),
        };
        self.origin.session().build_types().all().get(filter).await
    }

    /// Test occurrences recorded by this build.
    pub fn tests(&self) -> QuerySet<TestOccurrence> {
        self.origin
            .session()
            .tests()
            .all()
            .filter(TestOccurrenceFilter::default().build_id(self.id))
    }

    /// Builds this build depends on, including builds outside the default
    /// branch filter.
    pub fn snapshot_dependencies(&self) -> QuerySet<Build> {
        self.origin.session().builds().all().filter(
            BuildFilter::default()
                .snapshot_dependency_of(self.id)
                .default_filter(false),
        )
    }

    /// Build parameters, read from the `properties` field.
    pub fn parameters(&self) -> BTreeMap<String, Parameter> {
        parameters(&self.record, "properties")
    }
}
