//! Shared list/detail plumbing for the resource subcommands.

use serde::Serialize;
use tabled::Tabled;
use tcrest::resources::Resource;
use tcrest::{GetOptions, TeamCity};

use crate::commands::output::{OutputFormat, render};

/// Options shared by every resource subcommand.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct QueryOptions {
    /// Fetch a single record addressed by the filters instead of listing
    #[arg(short = 'g', long)]
    pub get: bool,

    /// Fetch a single record, failing if the filters match more than one (implies --get)
    #[arg(long)]
    pub strict: bool,

    /// Print the request URL without fetching
    #[arg(short = 'u', long)]
    pub url_only: bool,

    /// Output format (default from config or table)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl QueryOptions {
    /// Whether a single-record fetch was asked for.
    pub fn single(&self) -> bool {
        self.get || self.strict
    }
}

/// The URL a query would request, without fetching.
pub(crate) fn request_url<R: Resource>(
    session: &TeamCity,
    filter: R::Filter,
    detail: bool,
) -> tcrest::Result<String> {
    let mut query_set = session.manager::<R>().all();
    if detail {
        query_set.get_url(filter)
    } else {
        Ok(query_set.filter(filter).resolve_list_url())
    }
}

/// Run a list or single-record query and convert each entity to a row.
pub(crate) async fn fetch_rows<R, T>(
    session: &TeamCity,
    filter: R::Filter,
    detail: bool,
    strict: bool,
    to_row: impl Fn(&R) -> T,
) -> tcrest::Result<Vec<T>>
where
    R: Resource,
{
    let query_set = session.manager::<R>().all();

    if detail {
        let mut query_set = query_set;
        let options = GetOptions {
            raise_if_multiple: strict,
        };
        let entity = query_set.get_with(filter, options).await?;
        tracing::info!(url = ?query_set.url(), "Fetched record");
        return Ok(vec![to_row(&entity)]);
    }

    let mut query_set = query_set.filter(filter);
    let rows: Vec<T> = query_set.iter().await?.map(|entity| to_row(&entity)).collect();
    tracing::info!(
        url = ?query_set.url(),
        rows = rows.len(),
        count = ?query_set.summary().count,
        "Fetched list"
    );
    Ok(rows)
}

/// Run a query and print the result.
pub(crate) async fn run<R, T>(
    session: &TeamCity,
    filter: R::Filter,
    detail: bool,
    options: &QueryOptions,
    default_format: OutputFormat,
    to_row: impl Fn(&R) -> T,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: Resource,
    T: Tabled + Serialize,
{
    if options.url_only {
        println!("{}", request_url::<R>(session, filter, detail)?);
        return Ok(());
    }

    let rows = fetch_rows(session, filter, detail, options.strict, to_row).await?;
    println!("{}", render(rows, options.output.unwrap_or(default_format))?);
    Ok(())
}
