pub(crate) mod build_types;
pub(crate) mod builds;
pub(crate) mod meta;
pub(crate) mod output;
pub(crate) mod projects;
pub(crate) mod query;
pub(crate) mod queue;
pub(crate) mod test_occurrences;
