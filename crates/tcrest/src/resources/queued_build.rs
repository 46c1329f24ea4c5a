//! The build queue.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::Record;
use crate::error::Result;
use crate::locator::{Locator, LocatorValue};

use super::build_type::{BuildType, BuildTypeFilter};
use super::parameter::{Parameter, parameters};
use super::{Criteria, Origin, Resource, fields};

/// Filter criteria for `/app/rest/buildQueue/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuedBuildFilter {
    pub id: Option<i64>,
    /// Project locator; rendered as `project:(<project>)`.
    pub project: Option<String>,
    pub build_type: Option<String>,
    pub branch: Option<String>,
    pub user: Option<String>,
    pub start: Option<u64>,
    pub count: Option<u64>,
    pub lookup_limit: Option<u64>,
}

impl QueuedBuildFilter {
    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
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
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
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

impl Criteria for QueuedBuildFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(id) = self.id {
            locator.add("id", id);
        }
        if let Some(project) = &self.project {
            locator.add("project", LocatorValue::Literal(format!("({project})")));
        }
        if let Some(build_type) = &self.build_type {
            locator.add("buildType", build_type);
        }
        if let Some(branch) = &self.branch {
            locator.add("branch", branch);
        }
        if let Some(user) = &self.user {
            locator.add("user", user);
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

/// The user who triggered a queued build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggeredBy {
    pub username: Option<String>,
    pub name: Option<String>,
    pub id: Option<i64>,
}

impl TriggeredBy {
    fn from_record(record: &Record) -> Option<Self> {
        let user = fields::object(fields::object(record, "triggered")?, "user")?;
        Some(Self {
            username: fields::text(user, "username"),
            name: fields::text(user, "name"),
            id: fields::integer(user, "id"),
        })
    }
}

/// A build waiting in the queue.
#[derive(Debug, Clone)]
pub struct QueuedBuild {
    /// 0 when the record has no id.
    pub id: i64,
    pub build_type_id: Option<String>,
    pub state: Option<String>,
    pub branch_name: Option<String>,
    pub default_branch: Option<bool>,
    pub href: Option<String>,
    pub web_url: Option<String>,
    pub queued_date: Option<DateTime<FixedOffset>>,
    pub wait_reason: Option<String>,
    /// `None` unless the build was triggered by a user.
    pub triggered_by: Option<TriggeredBy>,
    record: Record,
    origin: Origin,
}

impl Resource for QueuedBuild {
    const PATH: &'static str = "/app/rest/buildQueue/";
    const COLLECTION: &'static str = "build";
    const DETAIL_KEYS: &'static [&'static str] = &["id", "buildType", "project"];

    type Filter = QueuedBuildFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        Self {
            id: fields::integer(&record, "id").unwrap_or_default(),
            build_type_id: fields::text(&record, "buildTypeId"),
            state: fields::text(&record, "state"),
            branch_name: fields::text(&record, "branchName"),
            default_branch: fields::flag(&record, "defaultBranch"),
            href: fields::text(&record, "href"),
            web_url: fields::text(&record, "webUrl"),
            queued_date: fields::timestamp(&record, "queuedDate"),
            wait_reason: fields::text(&record, "waitReason"),
            triggered_by: TriggeredBy::from_record(&record),
            record,
            origin,
        }
    }
}

impl QueuedBuild {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fetch the build configuration this build is queued for.
    pub async fn build_type(&self) -> Result<BuildType> {
        let filter = match &self.build_type_id {
            Some(build_type_id) => BuildTypeFilter::default().id(build_type_id),
            None => BuildTypeFilter::default(),
        };
        self.origin.session().build_types().all().get(filter).await
    }

    pub fn parameters(&self) -> BTreeMap<String, Parameter> {
        parameters(&self.record, "properties")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::GetOptions;
    use crate::error::Error;
    use crate::http::MockTransport;
    use crate::session::TeamCity;

    const BASE: &str = "http://tc.example.com";

    fn session(transport: &MockTransport) -> TeamCity {
        TeamCity::builder(BASE)
            .transport(Arc::new(transport.clone()))
            .build()
            .expect("session")
    }

    #[test]
    fn test_all_url() {
        let transport = MockTransport::new();
        let queued = session(&transport).queued_builds().all();
        assert!(queued.resolve_list_url().ends_with("/app/rest/buildQueue/"));
    }

    #[test]
    fn test_filter_by_project_and_count() {
        let transport = MockTransport::new();
        let queued = session(&transport)
            .queued_builds()
            .all()
            .filter(QueuedBuildFilter::default().project("Dummysvc_ReleaseToMt1").count(5));
        let url = queued.resolve_list_url();
        assert!(url.contains("project:(Dummysvc_ReleaseToMt1)"));
        assert!(url.contains("count:5"));
    }

    #[test]
    fn test_filter_by_build_type() {
        let transport = MockTransport::new();
        let queued = session(&transport)
            .queued_builds()
            .all()
            .filter(QueuedBuildFilter::default().build_type("DevOps_Metacloud_DeleteOldVMs"));
        assert!(
            queued
                .resolve_list_url()
                .contains("buildType:DevOps_Metacloud_DeleteOldVMs")
        );
    }

    #[tokio::test]
    async fn test_list_then_get_with_build_type() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/app/rest/buildQueue/?locator=branch:master,user:marca"),
            json!({
                "count": 2,
                "href": "/app/rest/buildQueue/",
                "build": [
                    {"id": 1455869, "buildTypeId": "Scansvc_PullRequests_Py27", "state": "queued",
                     "branchName": "master", "href": "/app/rest/buildQueue/id:1455869",
                     "webUrl": "https://tcserver/viewQueued.html?itemId=1455869"},
                    {"id": 1471658, "buildTypeId": "Responseweb_2_Branches_Package", "state": "queued",
                     "branchName": "master", "href": "/app/rest/buildQueue/id:1471658",
                     "webUrl": "https://tcserver/viewQueued.html?itemId=1471658"}
                ]
            }),
        );
        transport.push_json(
            format!("{BASE}/app/rest/buildQueue/id:1471658"),
            json!({
                "id": 1471658,
                "buildTypeId": "Responseweb_2_Branches_Package",
                "state": "queued",
                "queuedDate": "20160812T094312-0700",
                "waitReason": "Waiting to start checking for changes",
                "triggered": {
                    "type": "user",
                    "user": {"username": "marca", "name": "Marc Abramowitz", "id": 16}
                },
                "properties": {"property": [{"name": "env.PIP_USE_WHEEL", "value": "true"}]}
            }),
        );
        transport.push_json(
            format!("{BASE}/app/rest/buildTypes/id:Responseweb_2_Branches_Package"),
            json!({"id": "Responseweb_2_Branches_Package", "name": "package"}),
        );

        let tc = session(&transport);
        let mut queued = tc
            .queued_builds()
            .all()
            .filter(QueuedBuildFilter::default().branch("master").user("marca"));
        assert_eq!(queued.len().await.expect("len"), 2);
        for build in queued.iter().await.expect("iter") {
            assert_eq!(build.branch_name.as_deref(), Some("master"));
            assert!(build.web_url.is_some());
        }

        let build = tc
            .queued_builds()
            .all()
            .get(QueuedBuildFilter::default().id(1471658))
            .await
            .expect("get");
        assert_eq!(build.queued_date.map(|d| d.to_rfc3339()).as_deref(), Some("2016-08-12T09:43:12-07:00"));
        let user = build.triggered_by.clone().expect("user trigger");
        assert_eq!(user.username.as_deref(), Some("marca"));
        assert_eq!(user.id, Some(16));
        assert_eq!(build.parameters()["env.PIP_USE_WHEEL"].value.as_deref(), Some("true"));

        let build_type = build.build_type().await.expect("build type");
        assert_eq!(build_type.name.as_deref(), Some("package"));
    }

    #[tokio::test]
    async fn test_strict_get_by_project_raises_on_multiple() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/app/rest/buildQueue/?locator=project:(Foo)"),
            json!({"count": 2, "build": [{"id": 1}, {"id": 2}]}),
        );
        let mut queued = session(&transport).queued_builds().all();
        let err = queued
            .get_with(QueuedBuildFilter::default().project("Foo"), GetOptions::strict())
            .await
            .expect_err("two queued builds");
        assert!(matches!(err, Error::MultipleResults { count: 2 }));
    }

    #[tokio::test]
    async fn test_strict_get_with_list_filters_raises_on_multiple() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/app/rest/buildQueue/?locator=branch:master,user:marca,start:2,lookupLimit:2"),
            json!({
                "count": 2,
                "build": [
                    {"id": 1471658, "branchName": "master"},
                    {"id": 1471659, "branchName": "master"}
                ]
            }),
        );
        let mut queued = session(&transport).queued_builds().all();
        let err = queued
            .get_with(
                QueuedBuildFilter::default()
                    .branch("master")
                    .user("marca")
                    .start(2)
                    .lookup_limit(2),
                GetOptions::strict(),
            )
            .await
            .expect_err("two queued builds");
        assert!(matches!(err, Error::MultipleResults { count: 2 }));
        assert_eq!(transport.requests().len(), 1);
        assert!(queued.locator().is_empty());
    }

    #[tokio::test]
    async fn test_strict_get_with_single_list_match_rejects_list_filters() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/app/rest/buildQueue/?locator=branch:master"),
            json!({"count": 1, "build": [{"id": 1471658}]}),
        );
        let mut queued = session(&transport).queued_builds().all();
        let err = queued
            .get_with(QueuedBuildFilter::default().branch("master"), GetOptions::strict())
            .await
            .expect_err("branch does not address one queued build");
        assert!(matches!(err, Error::DetailLocator { .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_trigger_by_non_user_is_none() {
        let transport = MockTransport::new();
        let build = QueuedBuild::from_record(
            json!({"id": 5, "triggered": {"type": "vcs"}}).as_object().cloned().unwrap(),
            Origin::new(session(&transport), None),
        );
        assert_eq!(build.triggered_by, None);
    }
}
