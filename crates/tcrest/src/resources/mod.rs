//! Typed projections of TeamCity REST records.
//!
//! Each resource type implements [`Resource`], which tells the query engine
//! where the resource lives, how its list responses are shaped, which
//! predicates may address a single record, and how to build the entity from a
//! raw record.
//!
//! # Module Structure
//!
//! - [`project`] - Projects and their child projects / build types
//! - [`build_type`] - Build configurations
//! - [`build`] - Finished and running builds
//! - [`queued_build`] - The build queue
//! - [`test_occurrence`] - Test occurrences and their detail view
//! - [`parameter`] - Parameter lists embedded in records

pub mod build;
pub mod build_type;
pub mod parameter;
pub mod project;
pub mod queued_build;
pub mod test_occurrence;

mod fields;

pub use build::{Build, BuildFilter};
pub use build_type::{BuildType, BuildTypeFilter};
pub use parameter::Parameter;
pub use project::{Project, ProjectFilter};
pub use queued_build::{QueuedBuild, QueuedBuildFilter, TriggeredBy};
pub use test_occurrence::{
    TestOccurrence, TestOccurrenceDetail, TestOccurrenceDetailFilter, TestOccurrenceFilter,
};

use crate::Record;
use crate::locator::Locator;
use crate::pagination::MergeSchema;
use crate::session::TeamCity;

/// Filter criteria for one resource type.
///
/// Implementors forward each criterion that is set to the locator, in field
/// declaration order.
pub trait Criteria {
    fn apply(&self, locator: &mut Locator);
}

/// A resource type the query engine can list and fetch.
pub trait Resource: Sized {
    /// Resource root, relative to the session base URL. Ends with `/` so a
    /// detail locator can be appended directly.
    const PATH: &'static str;

    /// Name of the array field holding records in list responses.
    const COLLECTION: &'static str;

    /// Top-level predicate names that may appear in a detail-mode locator.
    const DETAIL_KEYS: &'static [&'static str];

    type Filter: Criteria + Default;

    /// How pages of a list response are merged.
    fn schema() -> MergeSchema {
        MergeSchema::list(Self::COLLECTION)
    }

    fn from_record(record: Record, origin: Origin) -> Self;
}

/// Where a record came from: the session to issue follow-on queries with and
/// the URL it was fetched from, if any.
#[derive(Debug, Clone)]
pub struct Origin {
    session: TeamCity,
    url: Option<String>,
}

impl Origin {
    pub fn new(session: TeamCity, url: Option<String>) -> Self {
        Self { session, url }
    }

    pub fn session(&self) -> &TeamCity {
        &self.session
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
