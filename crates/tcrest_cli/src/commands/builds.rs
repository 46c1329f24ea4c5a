use serde::Serialize;
use tabled::Tabled;
use tcrest::TeamCity;
use tcrest::resources::{Build, BuildFilter};

use crate::commands::output::{OutputFormat, cell};
use crate::commands::query::{QueryOptions, run};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BuildsArgs {
    /// Fetch the build with this id
    #[arg(long)]
    id: Option<i64>,

    /// Filter by build number
    #[arg(long)]
    number: Option<String>,

    /// Filter by build configuration id
    #[arg(short = 'b', long, value_name = "BUILD_TYPE_ID")]
    build_type: Option<String>,

    /// Filter by branch name
    #[arg(long)]
    branch: Option<String>,

    /// Filter by status, e.g. SUCCESS or FAILURE
    #[arg(long)]
    status: Option<String>,

    /// Filter by state, e.g. queued, running or finished
    #[arg(long)]
    state: Option<String>,

    /// Filter by triggering user
    #[arg(long)]
    user: Option<String>,

    /// Filter by tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Filter by pinned state
    #[arg(long, value_name = "BOOL")]
    pinned: Option<bool>,

    /// Filter by running state
    #[arg(long, value_name = "BOOL")]
    running: Option<bool>,

    /// Filter by canceled state
    #[arg(long, value_name = "BOOL")]
    canceled: Option<bool>,

    /// Filter by agent name
    #[arg(long)]
    agent: Option<String>,

    /// Skip this many builds
    #[arg(long)]
    start: Option<u64>,

    /// Return at most this many builds per page
    #[arg(short = 'c', long)]
    count: Option<u64>,

    /// Stop searching after this many builds
    #[arg(long)]
    lookup_limit: Option<u64>,

    #[command(flatten)]
    options: QueryOptions,
}

impl BuildsArgs {
    fn filter(&self) -> BuildFilter {
        BuildFilter {
            id: self.id,
            number: self.number.clone(),
            build_type: self.build_type.clone(),
            branch: self.branch.clone(),
            status: self.status.clone(),
            state: self.state.clone(),
            user: self.user.clone(),
            tags: self.tags.clone(),
            pinned: self.pinned,
            running: self.running,
            canceled: self.canceled,
            agent_name: self.agent.clone(),
            start: self.start,
            count: self.count,
            lookup_limit: self.lookup_limit,
            ..BuildFilter::default()
        }
    }

    fn detail(&self) -> bool {
        self.id.is_some() || self.options.single()
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct BuildRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Number")]
    pub number: String,
    #[tabled(rename = "Build Type")]
    pub build_type: String,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Started")]
    pub started: String,
}

impl BuildRow {
    pub(crate) fn new(build: &Build) -> Self {
        Self {
            id: build.id,
            number: cell(build.number.as_deref()),
            build_type: cell(build.build_type_id.as_deref()),
            branch: cell(build.branch_name.as_deref()),
            state: cell(build.state.as_deref()),
            status: cell(build.status.as_deref()),
            started: cell(build.start_date.map(|d| d.to_rfc3339())),
        }
    }
}

pub(crate) async fn handle_builds(
    args: BuildsArgs,
    session: &TeamCity,
    default_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    run::<Build, BuildRow>(
        session,
        args.filter(),
        args.detail(),
        &args.options,
        default_format,
        BuildRow::new,
    )
    .await
}
