use serde::Serialize;
use tabled::Tabled;
use tcrest::TeamCity;
use tcrest::resources::{Project, ProjectFilter};

use crate::commands::output::{OutputFormat, cell};
use crate::commands::query::{QueryOptions, run};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ProjectsArgs {
    /// Fetch the project with this id
    #[arg(long)]
    id: Option<String>,

    /// Filter by project name
    #[arg(long)]
    name: Option<String>,

    #[command(flatten)]
    options: QueryOptions,
}

impl ProjectsArgs {
    fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    fn detail(&self) -> bool {
        self.id.is_some() || self.options.single()
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct ProjectRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Parent")]
    pub parent: String,
    #[tabled(rename = "Web URL")]
    pub web_url: String,
}

impl ProjectRow {
    pub(crate) fn new(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: cell(project.name.as_deref()),
            parent: cell(project.parent_project_id.as_deref()),
            web_url: cell(project.web_url.as_deref()),
        }
    }
}

pub(crate) async fn handle_projects(
    args: ProjectsArgs,
    session: &TeamCity,
    default_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    run::<Project, ProjectRow>(
        session,
        args.filter(),
        args.detail(),
        &args.options,
        default_format,
        ProjectRow::new,
    )
    .await
}
