use serde::Serialize;
use tabled::Tabled;
use tcrest::TeamCity;
use tcrest::resources::{QueuedBuild, QueuedBuildFilter};

use crate::commands::output::{OutputFormat, cell};
use crate::commands::query::{QueryOptions, run};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct QueueArgs {
    /// Fetch the queued build with this id
    #[arg(long)]
    id: Option<i64>,

    /// Filter by project locator, e.g. a project id
    #[arg(long)]
    project: Option<String>,

    /// Filter by build configuration id
    #[arg(short = 'b', long, value_name = "BUILD_TYPE_ID")]
    build_type: Option<String>,

    /// Filter by branch name
    #[arg(long)]
    branch: Option<String>,

    /// Filter by triggering user
    #[arg(long)]
    user: Option<String>,

    /// Skip this many entries
    #[arg(long)]
    start: Option<u64>,

    /// Return at most this many entries per page
    #[arg(short = 'c', long)]
    count: Option<u64>,

    /// Stop searching after this many entries
    #[arg(long)]
    lookup_limit: Option<u64>,

    #[command(flatten)]
    options: QueryOptions,
}

impl QueueArgs {
    fn filter(&self) -> QueuedBuildFilter {
        QueuedBuildFilter {
            id: self.id,
            project: self.project.clone(),
            build_type: self.build_type.clone(),
            branch: self.branch.clone(),
            user: self.user.clone(),
            start: self.start,
            count: self.count,
            lookup_limit: self.lookup_limit,
        }
    }

    fn detail(&self) -> bool {
        self.id.is_some() || self.options.single()
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct QueuedBuildRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Build Type")]
    pub build_type: String,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Queued")]
    pub queued: String,
    #[tabled(rename = "Triggered By")]
    pub triggered_by: String,
    #[tabled(rename = "Wait Reason")]
    pub wait_reason: String,
}

impl QueuedBuildRow {
    pub(crate) fn new(build: &QueuedBuild) -> Self {
        Self {
            id: build.id,
            build_type: cell(build.build_type_id.as_deref()),
            branch: cell(build.branch_name.as_deref()),
            queued: cell(build.queued_date.map(|d| d.to_rfc3339())),
            triggered_by: cell(
                build
                    .triggered_by
                    .as_ref()
                    .and_then(|user| user.username.as_deref()),
            ),
            wait_reason: cell(build.wait_reason.as_deref()),
        }
    }
}

pub(crate) async fn handle_queue(
    args: QueueArgs,
    session: &TeamCity,
    default_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    run::<QueuedBuild, QueuedBuildRow>(
        session,
        args.filter(),
        args.detail(),
        &args.options,
        default_format,
        QueuedBuildRow::new,
    )
    .await
}
