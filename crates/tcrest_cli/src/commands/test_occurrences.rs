use serde::Serialize;
use tabled::Tabled;
use tcrest::TeamCity;
use tcrest::resources::{
    TestOccurrence, TestOccurrenceDetail, TestOccurrenceDetailFilter, TestOccurrenceFilter,
};

use crate::commands::output::{OutputFormat, cell};
use crate::commands::query::{QueryOptions, run};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TestsArgs {
    /// Fetch the occurrence of this test id (combine with --build)
    #[arg(long)]
    id: Option<String>,

    /// Build id whose test occurrences to list
    #[arg(short = 'b', long, value_name = "BUILD_ID")]
    build: Option<String>,

    /// Filter by status, e.g. FAILURE
    #[arg(long)]
    status: Option<String>,

    #[command(flatten)]
    options: QueryOptions,
}

impl TestsArgs {
    fn filter(&self) -> TestOccurrenceFilter {
        TestOccurrenceFilter {
            build_id: self.build.clone(),
            status: self.status.clone(),
        }
    }

    fn detail_filter(&self) -> TestOccurrenceDetailFilter {
        TestOccurrenceDetailFilter {
            test_id: self.id.clone(),
            build_id: self.build.clone(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct TestOccurrenceRow {
    #[tabled(rename = "Test ID")]
    pub test_id: String,
    #[tabled(rename = "Build ID")]
    pub build_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Duration (ms)")]
    pub duration: String,
}

impl TestOccurrenceRow {
    pub(crate) fn new(test: &TestOccurrence) -> Self {
        Self {
            test_id: cell(test.test_id.as_deref()),
            build_id: cell(test.build_id.as_deref()),
            name: cell(test.name.as_deref()),
            status: cell(test.status.as_deref()),
            duration: cell(test.duration),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct TestDetailRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Duration (ms)")]
    pub duration: String,
    #[tabled(rename = "Ignored")]
    pub ignored: String,
    #[tabled(rename = "Details")]
    pub details: String,
}

impl TestDetailRow {
    pub(crate) fn new(detail: &TestOccurrenceDetail) -> Self {
        Self {
            id: detail.id.clone(),
            name: cell(detail.name.as_deref()),
            status: cell(detail.status.as_deref()),
            duration: cell(detail.duration),
            ignored: cell(detail.ignored),
            details: cell(
                detail
                    .details
                    .as_deref()
                    .or(detail.ignore_details.as_deref()),
            ),
        }
    }
}

pub(crate) async fn handle_tests(
    args: TestsArgs,
    session: &TeamCity,
    default_format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.id.is_some() {
        return run::<TestOccurrenceDetail, TestDetailRow>(
            session,
            args.detail_filter(),
            true,
            &args.options,
            default_format,
            TestDetailRow::new,
        )
        .await;
    }

    run::<TestOccurrence, TestOccurrenceRow>(
        session,
        args.filter(),
        args.options.single(),
        &args.options,
        default_format,
        TestOccurrenceRow::new,
    )
    .await
}
