//! Projects.

use std::collections::BTreeMap;

use crate::Record;
use crate::error::Result;
use crate::locator::Locator;
use crate::pagination::MergedResult;
use crate::queryset::QuerySet;

use super::build_type::{BuildType, BuildTypeFilter};
use super::parameter::{Parameter, parameters};
use super::{Criteria, Origin, Resource, fields};

/// Filter criteria for `/app/rest/projects/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ProjectFilter {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Criteria for ProjectFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(id) = &self.id {
            locator.add("id", id);
        }
        if let Some(name) = &self.name {
            locator.add("name", name);
        }
    }
}

/// A TeamCity project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Empty when the record has no id.
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub href: Option<String>,
    pub web_url: Option<String>,
    pub parent_project_id: Option<String>,
    pub archived: Option<bool>,
    record: Record,
    origin: Origin,
}

impl Resource for Project {
    const PATH: &'static str = "/app/rest/projects/";
    const COLLECTION: &'static str = "project";
    const DETAIL_KEYS: &'static [&'static str] = &["id", "name", "parentProject"];

    type Filter = ProjectFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        Self {
            id: fields::text(&record, "id").unwrap_or_default(),
            name: fields::text(&record, "name"),
            description: fields::text(&record, "description"),
            href: fields::text(&record, "href"),
            web_url: fields::text(&record, "webUrl"),
            parent_project_id: fields::text(&record, "parentProjectId"),
            archived: fields::flag(&record, "archived"),
            record,
            origin,
        }
    }
}

impl Project {
    /// The raw record this project was built from.
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Build types owned by this project.
    pub fn build_types(&self) -> QuerySet<BuildType> {
        self.origin
            .session()
            .build_types()
            .all()
            .filter(BuildTypeFilter::default().project_id(&self.id))
    }

    /// Child projects embedded in this record.
    ///
    /// Only detail records carry the `projects` field; for list records the
    /// returned query set is empty. No request is made.
    pub fn projects(&self) -> QuerySet<Project> {
        let embedded = fields::object(&self.record, "projects")
            .cloned()
            .unwrap_or_default();
        QuerySet::with_cached(
            self.origin.session().clone(),
            MergedResult::from_record(embedded, Project::schema()),
        )
    }

    /// Fetch the parent project. `None` for the root project.
    pub async fn parent_project(&self) -> Result<Option<Project>> {
        let Some(parent_id) = &self.parent_project_id else {
            return Ok(None);
        };
        let parent = self
            .origin
            .session()
            .projects()
            .all()
            .get(ProjectFilter::default().id(parent_id))
            .await?;
        Ok(Some(parent))
    }

    pub fn parameters(&self) -> BTreeMap<String, Parameter> {
        parameters(&self.record, "parameters")
    }
}
