//! Build configurations.

use std::collections::BTreeMap;

use crate::Record;
use crate::error::Result;
use crate::locator::Locator;
use crate::queryset::QuerySet;

use super::build::{Build, BuildFilter};
use super::parameter::{Parameter, parameters};
use super::project::{Project, ProjectFilter};
use super::{Criteria, Origin, Resource, fields};

/// Filter criteria for `/app/rest/buildTypes/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTypeFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Rendered as `project:(id:<id>)`.
    pub project_id: Option<String>,
    /// Rendered as `affectedProject:(id:<id>)`, matching nested projects too.
    pub affected_project_id: Option<String>,
    pub paused: Option<bool>,
    /// Rendered as `template:(id:<id>)`.
    pub template_id: Option<String>,
    pub template_flag: Option<bool>,
}

impl BuildTypeFilter {
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

    #[must_use]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn affected_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.affected_project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    #[must_use]
    pub fn template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    #[must_use]
    pub fn template_flag(mut self, template_flag: bool) -> Self {
        self.template_flag = Some(template_flag);
        self
    }
}

impl Criteria for BuildTypeFilter {
    fn apply(&self, locator: &mut Locator) {
        if let Some(id) = &self.id {
            locator.add("id", id);
        }
        if let Some(name) = &self.name {
            locator.add("name", name);
        }
        if let Some(project_id) = &self.project_id {
            locator.add("project", Locator::by_id(project_id));
        }
        if let Some(project_id) = &self.affected_project_id {
            locator.add("affectedProject", Locator::by_id(project_id));
        }
        if let Some(paused) = self.paused {
            locator.add("paused", paused);
        }
        if let Some(template_id) = &self.template_id {
            locator.add("template", Locator::by_id(template_id));
        }
        if let Some(template_flag) = self.template_flag {
            locator.add("templateFlag", template_flag);
        }
    }
}

/// A build configuration.
#[derive(Debug, Clone)]
pub struct BuildType {
    /// Empty when the record has no id.
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub href: Option<String>,
    pub web_url: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub paused: Option<bool>,
    pub template_flag: Option<bool>,
    record: Record,
    origin: Origin,
}

impl Resource for BuildType {
    const PATH: &'static str = "/app/rest/buildTypes/";
    const COLLECTION: &'static str = "buildType";
    const DETAIL_KEYS: &'static [&'static str] = &["id", "name", "project", "affectedProject"];

    type Filter = BuildTypeFilter;

    fn from_record(record: Record, origin: Origin) -> Self {
        Self {
            id: fields::text(&record, "id").unwrap_or_default(),
            name: fields::text(&record, "name"),
            description: fields::text(&record, "description"),
            href: fields::text(&record, "href"),
            web_url: fields::text(&record, "webUrl"),
            project_id: fields::text(&record, "projectId"),
            project_name: fields::text(&record, "projectName"),
            paused: fields::flag(&record, "paused"),
            template_flag: fields::flag(&record, "templateFlag"),
            record,
            origin,
        }
    }
}

impl BuildType {
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fetch the owning project.
    ///
    /// Fails with [`crate::Error::DetailLocator`] when the record carries no
    /// project id.
    pub async fn project(&self) -> Result<Project> {
        let filter = match &self.project_id {
            Some(project_id) => ProjectFilter::default().id(project_id),
            None => ProjectFilter::default(),
        };
        self.origin.session().projects().all().get(filter).await
    }

    /// Builds of this configuration.
    pub fn builds(&self) -> QuerySet<Build> {
        self.origin
            .session()
            .builds()
            .all()
            .filter(BuildFilter::default().build_type(&self.id))
    }

    pub fn parameters(&self) -> BTreeMap<String, Parameter> {
        parameters(&self.record, "parameters")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::Error;
    use crate::http::MockTransport;
    use crate::session::TeamCity;

    const BASE: &str = "http://tc.example.com";

    fn session(transport: &MockTransport) -> TeamCity {
        TeamCity::builder(BASE)
            .path_prefix("/guestAuth")
            .transport(Arc::new(transport.clone()))
            .build()
            .expect("session")
    }

    #[test]
    fn test_all_filters_render_in_declaration_order() {
        let mut locator = Locator::new();
        BuildTypeFilter::default()
            .template_flag(false)
            .template_id("Tmpl")
            .paused(true)
            .affected_project_id("Root")
            .project_id("Foo")
            .name("package")
            .id("Foo_Package")
            .apply(&mut locator);
        assert_eq!(
            locator.render(),
            "id:Foo_Package,name:package,project:(id:Foo),affectedProject:(id:Root),\
             paused:true,template:(id:Tmpl),templateFlag:false"
        );
    }

    #[tokio::test]
    async fn test_list_and_project_relation() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{BASE}/guestAuth/app/rest/buildTypes/?locator=project:(id:Responseweb_2_Branches)"),
            json!({
                "count": 1,
                "buildType": [{
                    "id": "Responseweb_2_Branches_Package",
                    "name": "package",
                    "projectName": "responseweb :: branches",
                    "projectId": "Responseweb_2_Branches",
                    "href": "/guestAuth/app/rest/buildTypes/id:Responseweb_2_Branches_Package",
                    "webUrl": "https://tcserver/viewType.html?buildTypeId=Responseweb_2_Branches_Package"
                }]
            }),
        );
        transport.push_json(
            format!("{BASE}/guestAuth/app/rest/projects/id:Responseweb_2_Branches"),
            json!({"id": "Responseweb_2_Branches", "name": "branches"}),
        );

        let tc = session(&transport);
        let mut build_types = tc
            .build_types()
            .all()
            .filter(BuildTypeFilter::default().project_id("Responseweb_2_Branches"));
        let bt = build_types.nth(0).await.expect("first");
        assert_eq!(bt.id, "Responseweb_2_Branches_Package");
        assert_eq!(bt.project_name.as_deref(), Some("responseweb :: branches"));
        assert_eq!(
            bt.origin().url(),
            Some("http://tc.example.com/guestAuth/app/rest/buildTypes/?locator=project:(id:Responseweb_2_Branches)")
        );

        let project = bt.project().await.expect("project");
        assert_eq!(project.name.as_deref(), Some("branches"));
    }

    #[tokio::test]
    async fn test_project_without_id_is_a_configuration_error() {
        let transport = MockTransport::new();
        let bt = BuildType::from_record(
            json!({"id": "Orphan"}).as_object().cloned().unwrap(),
            Origin::new(session(&transport), None),
        );
        let err = bt.project().await.expect_err("no project id");
        assert!(matches!(err, Error::DetailLocator { .. }));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_builds_query() {
        let transport = MockTransport::new();
        let bt = BuildType::from_record(
            json!({"id": "bt1"}).as_object().cloned().unwrap(),
            Origin::new(session(&transport), None),
        );
        assert_eq!(
            bt.builds().resolve_list_url(),
            format!("{BASE}/guestAuth/app/rest/builds/?locator=buildType:bt1")
        );
    }
}
