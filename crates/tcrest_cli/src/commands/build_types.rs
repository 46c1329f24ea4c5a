use serde::Serialize;
use tabled::Tabled;
use tcrest::TeamCity;
use tcrest::resources::{BuildType, BuildTypeFilter};

use crate::commands::output::{OutputFormat, cell};
use crate::commands::query::{QueryOptions, run};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BuildTypesArgs {
    /// Fetch the build configuration with this id
    #[arg(long)]
    id: Option<String>,

    /// Filter by build configuration name
    #[arg(long)]
    name: Option<String>,

    /// Only configurations directly in this project
    #[arg(long, value_name = "PROJECT_ID")]
    project: Option<String>,

    /// Configurations in this project or any of its subprojects
    #[arg(long, value_name = "PROJECT_ID")]
    affected_project: Option<String>,

    /// Filter by paused state
    #[arg(long, value_name = "BOOL")]
    paused: Option<bool>,

    /// Only configurations based on this template
    #[arg(long, value_name = "TEMPLATE_ID")]
    template: Option<String>,

    /// List templates instead of configurations
    #[arg(long, value_name = "BOOL")]
    template_flag: Option<bool>,

    #[command(flatten)]
    options: QueryOptions,
}

impl BuildTypesArgs {
    fn filter(&self) -> BuildTypeFilter {
        BuildTypeFilter {
            id: self.id.clone(),
            name: self.name.clone(),
            project_id: self.project.clone(),
            affected_project_id: self.affected_project.clone(),
            paused: self.paused,
            template_id: self.template.clone(),
            template_flag: self.template_flag,
        }
    }

    fn detail(&self) -> bool {
        self.id.is_some() || self.options.single()
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct BuildTypeRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Project")]
    pub project: String,
    #[tabled(rename = "Paused")]
    pub paused: String,
}

impl BuildTypeRow {
    pub(crate) fn new(build_type: &BuildType) -> Self {
        Self {
            id: build_type.id.clone(),
            name: cell(build_type.name.as_deref()),
            project: cell(
                build_type
                    .project_name
                    .as_deref()
                    .or(build_type.project_id.as_deref()),
            ),
            paused: cell(build_type.paused),
        }
    }
}

pub(crate) async fn handle_build_types(
    args: BuildTypesArgs,
    session: &TeamCity,
    default_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    run::<BuildType, BuildTypeRow>(
        session,
        args.filter(),
        args.detail(),
        &args.options,
        default_format,
        BuildTypeRow::new,
    )
    .await
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::commands::query::request_url;
    use crate::commands::query::testing::{SERVER, StubServer};

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: BuildTypesArgs,
    }

    fn parse(argv: &[&str]) -> BuildTypesArgs {
        Harness::try_parse_from(std::iter::once("build-types").chain(argv.iter().copied()))
            .expect("parse")
            .args
    }

    #[test]
    fn project_filter_renders_sub_locator() {
        let args = parse(&["--project", "Foo", "--paused", "false"]);
        let url = request_url::<BuildType>(
            &StubServer::default().session(),
            args.filter(),
            args.detail(),
        )
        .expect("url");
        assert_eq!(
            url,
            format!("{SERVER}/app/rest/buildTypes/?locator=project:(id:Foo),paused:false")
        );
    }

    #[test]
    fn get_with_affected_project_uses_detail_url() {
        let args = parse(&["--affected-project", "Root", "--name", "package", "--get"]);
        assert!(args.detail());
        let url = request_url::<BuildType>(
            &StubServer::default().session(),
            args.filter(),
            args.detail(),
        )
        .expect("url");
        assert_eq!(
            url,
            format!("{SERVER}/app/rest/buildTypes/name:package,affectedProject:(id:Root)")
        );
    }

    #[tokio::test]
    async fn rows_prefer_project_name() {
        let server = StubServer::default();
        server.route(
            format!("{SERVER}/app/rest/buildTypes/"),
            serde_json::json!({
                "count": 2,
                "buildType": [
                    {"id": "Foo_Package", "name": "package", "projectName": "foo", "projectId": "Foo"},
                    {"id": "Bar_Test", "projectId": "Bar", "paused": true}
                ]
            }),
        );
        let rows = crate::commands::query::fetch_rows::<BuildType, BuildTypeRow>(
            &server.session(),
            BuildTypeFilter::default(),
            false,
            false,
            BuildTypeRow::new,
        )
        .await
        .expect("rows");
        assert_eq!(rows[0].project, "foo");
        assert_eq!(rows[1].project, "Bar");
        assert_eq!(rows[1].paused, "true");
        assert_eq!(rows[1].name, "");
    }
}
