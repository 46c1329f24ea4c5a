//! Pagination accumulator.
//!
//! TeamCity list responses carry an optional `nextHref` pointing at the next
//! page. [`accumulate`] follows those links sequentially and folds every page
//! into one [`MergedResult`] using a [`MergeSchema`] declared by the resource.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use serde_json::Value;

use crate::Record;
use crate::error::Result;

/// Field carrying the next page's href.
pub const NEXT_HREF: &str = "nextHref";

/// Field carrying the number of records in a list response.
pub const COUNT: &str = "count";

/// Which page to fetch next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// The first page, addressed by the query set's own list URL.
    First,
    /// A `nextHref` value from the previous page.
    Next(String),
}

/// How a field present in more than one page is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Integers are added.
    Sum,
    /// Arrays are concatenated in page order.
    Concat,
    /// The latest page wins.
    Overwrite,
}

/// Per-field merge policies. Undeclared fields use [`MergePolicy::Overwrite`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSchema {
    fields: HashMap<String, MergePolicy>,
}

impl MergeSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema for a standard list response: `count` is summed and the
    /// collection field is concatenated.
    #[must_use]
    pub fn list(collection: &str) -> Self {
        Self::new()
            .field(COUNT, MergePolicy::Sum)
            .field(collection, MergePolicy::Concat)
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, policy: MergePolicy) -> Self {
        self.fields.insert(name.into(), policy);
        self
    }

    #[must_use]
    pub fn policy(&self, name: &str) -> MergePolicy {
        self.fields
            .get(name)
            .copied()
            .unwrap_or(MergePolicy::Overwrite)
    }

    /// Fields declared with [`MergePolicy::Sum`].
    pub fn sum_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, p)| **p == MergePolicy::Sum)
            .map(|(name, _)| name.as_str())
    }
}

/// Integer fields of a merged list response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSummary {
    /// Total number of records across all pages.
    pub count: Option<u64>,
    /// Every [`MergePolicy::Sum`] field of the schema that was present.
    pub totals: BTreeMap<String, i64>,
}

impl ListSummary {
    /// Total of a summed field.
    #[must_use]
    pub fn total(&self, field: &str) -> Option<i64> {
        self.totals.get(field).copied()
    }
}

/// All pages of one logical fetch folded into a single record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedResult {
    record: Record,
    pages: usize,
    schema: MergeSchema,
}

impl MergedResult {
    /// Wrap a record that was not produced by pagination (e.g. a nested
    /// collection embedded in a parent record).
    #[must_use]
    pub fn from_record(record: Record, schema: MergeSchema) -> Self {
        Self {
            record,
            pages: 0,
            schema,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// Number of pages that were merged.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages
    }

    #[must_use]
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.record.get(field).and_then(Value::as_i64)
    }

    /// Records under `field`. Absent or non-array fields yield an empty slice.
    pub fn collection(&self, field: &str) -> &[Value] {
        self.record
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn summary(&self) -> ListSummary {
        let totals = self
            .schema
            .sum_fields()
            .filter_map(|field| Some((field.to_string(), self.integer(field)?)))
            .collect();
        ListSummary {
            count: self.record.get(COUNT).and_then(Value::as_u64),
            totals,
        }
    }
}

/// Folds pages into a [`MergedResult`].
#[derive(Debug, Clone)]
pub struct Accumulator {
    schema: MergeSchema,
    merged: MergedResult,
}

impl Accumulator {
    #[must_use]
    pub fn new(schema: MergeSchema) -> Self {
        Self {
            merged: MergedResult {
                schema: schema.clone(),
                ..MergedResult::default()
            },
            schema,
        }
    }

    /// Merge one page. `nextHref` is consumed and returned rather than stored.
    pub fn merge(&mut self, mut page: Record) -> Option<String> {
        let next = next_token(&page);
        page.remove(NEXT_HREF);

        for (key, value) in page {
            let policy = self.schema.policy(&key);
            match self.merged.record.get_mut(&key) {
                Some(existing) => merge_value(&key, policy, existing, value),
                None => {
                    self.merged.record.insert(key, value);
                }
            }
        }
        self.merged.pages += 1;
        next
    }

    #[must_use]
    pub fn finish(self) -> MergedResult {
        self.merged
    }
}

fn next_token(page: &Record) -> Option<String> {
    match page.get(NEXT_HREF) {
        Some(Value::String(href)) => Some(href.clone()),
        _ => None,
    }
}

fn merge_value(key: &str, policy: MergePolicy, existing: &mut Value, incoming: Value) {
    let merged = match (policy, existing.take(), incoming) {
        (MergePolicy::Concat, Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Value::Array(items)
        }
        (MergePolicy::Sum, Value::Number(total), Value::Number(more)) => {
            match (total.as_i64(), more.as_i64()) {
                (Some(a), Some(b)) => match a.checked_add(b) {
                    Some(sum) => Value::from(sum),
                    None => {
                        tracing::warn!(field = key, "Summed field overflowed, overwriting");
                        Value::Number(more)
                    }
                },
                _ => {
                    tracing::warn!(field = key, "Non-integer value in summed field, overwriting");
                    Value::Number(more)
                }
            }
        }
        (MergePolicy::Overwrite, _, incoming) => incoming,
        (policy, _, incoming) => {
            tracing::warn!(field = key, ?policy, "Merge policy does not fit value, overwriting");
            incoming
        }
    };
    *existing = merged;
}

/// Fetch every page starting from [`PageToken::First`] and merge them.
///
/// Pages are fetched one at a time; each next token comes from the previous
/// page. The first error aborts and is returned, discarding pages merged so
/// far.
pub async fn accumulate<F, Fut>(schema: MergeSchema, mut fetch: F) -> Result<MergedResult>
where
    F: FnMut(PageToken) -> Fut,
    Fut: Future<Output = Result<Record>>,
{
    let mut accumulator = Accumulator::new(schema);
    let mut token = PageToken::First;

    loop {
        let page = fetch(token).await?;
        let next = accumulator.merge(page);
        tracing::debug!(
            page = accumulator.merged.pages,
            has_next = next.is_some(),
            "Merged page"
        );
        match next {
            Some(href) => token = PageToken::Next(href),
            None => break,
        }
    }

    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("test fixture must be an object, got {other}"),
        }
    }

    fn merge_all(schema: &MergeSchema, pages: Vec<Record>) -> MergedResult {
        let mut acc = Accumulator::new(schema.clone());
        for page in pages {
            acc.merge(page);
        }
        acc.finish()
    }

    #[test]
    fn test_list_schema_policies() {
        let schema = MergeSchema::list("build");
        assert_eq!(schema.policy("count"), MergePolicy::Sum);
        assert_eq!(schema.policy("build"), MergePolicy::Concat);
        assert_eq!(schema.policy("href"), MergePolicy::Overwrite);
        assert_eq!(schema.sum_fields().collect::<Vec<_>>(), vec!["count"]);
    }

    #[test]
    fn test_two_pages_sum_and_concat() {
        let schema = MergeSchema::list("build");
        let merged = merge_all(
            &schema,
            vec![
                record(json!({"count": 1, "build": [{"id": 1}], "nextHref": "/page2"})),
                record(json!({"count": 1, "build": [{"id": 2}]})),
            ],
        );
        assert_eq!(merged.pages(), 2);
        assert_eq!(merged.summary().count, Some(2));
        let ids: Vec<_> = merged
            .collection("build")
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(!merged.record().contains_key(NEXT_HREF));
    }

    #[test]
    fn test_summary_promotes_every_summed_field() {
        let schema = MergeSchema::list("testOccurrence")
            .field("passed", MergePolicy::Sum)
            .field("failed", MergePolicy::Sum);
        let merged = merge_all(
            &schema,
            vec![
                record(json!({"count": 3, "passed": 2, "failed": 1, "testOccurrence": []})),
                record(json!({"count": 2, "passed": 2, "testOccurrence": []})),
            ],
        );
        let summary = merged.summary();
        assert_eq!(summary.count, Some(5));
        assert_eq!(summary.total("passed"), Some(4));
        assert_eq!(summary.total("failed"), Some(1));
        assert_eq!(summary.total("ignored"), None);
        assert_eq!(summary.totals.len(), 3);
    }

    #[test]
    fn test_sum_overflow_overwrites() {
        let schema = MergeSchema::list("build");
        let merged = merge_all(
            &schema,
            vec![
                record(json!({"count": i64::MAX})),
                record(json!({"count": 1})),
            ],
        );
        assert_eq!(merged.integer("count"), Some(1));
    }

    #[test]
    fn test_undeclared_fields_last_write_wins() {
        let schema = MergeSchema::list("build");
        let merged = merge_all(
            &schema,
            vec![
                record(json!({"href": "/a", "other": [1]})),
                record(json!({"href": "/b", "other": [2]})),
            ],
        );
        assert_eq!(merged.record()["href"], json!("/b"));
        assert_eq!(merged.record()["other"], json!([2]));
    }

    #[test]
    fn test_policy_mismatch_overwrites() {
        let schema = MergeSchema::list("build");
        let merged = merge_all(
            &schema,
            vec![
                record(json!({"count": "many"})),
                record(json!({"count": 3})),
            ],
        );
        assert_eq!(merged.integer("count"), Some(3));
    }

    #[test]
    fn test_merge_is_associative() {
        let schema = MergeSchema::list("build");
        let p1 = record(json!({"count": 2, "build": [{"id": 1}, {"id": 2}]}));
        let p2 = record(json!({"count": 1, "build": [{"id": 3}]}));
        let p3 = record(json!({"count": 4, "build": [{"id": 4}, {"id": 5}, {"id": 6}, {"id": 7}]}));

        let sequential = merge_all(&schema, vec![p1.clone(), p2.clone(), p3.clone()]);

        let first_two = merge_all(&schema, vec![p1.clone(), p2.clone()]).into_record();
        let left = merge_all(&schema, vec![first_two, p3.clone()]);

        let last_two = merge_all(&schema, vec![p2, p3]).into_record();
        let right = merge_all(&schema, vec![p1, last_two]);

        assert_eq!(sequential.record(), left.record());
        assert_eq!(sequential.record(), right.record());
        assert_eq!(sequential.summary().count, Some(7));
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let merged = MergedResult::from_record(
            record(json!({"count": 0})),
            MergeSchema::list("testOccurrence"),
        );
        assert!(merged.collection("testOccurrence").is_empty());
        assert_eq!(merged.summary().count, Some(0));
        assert_eq!(merged.summary().total("count"), Some(0));
    }

    #[test]
    fn test_summary_without_count() {
        let merged = MergedResult::from_record(Record::new(), MergeSchema::list("build"));
        assert_eq!(merged.summary().count, None);
        assert!(merged.summary().totals.is_empty());
    }

    #[test]
    fn test_non_string_next_href_is_terminal() {
        let mut acc = Accumulator::new(MergeSchema::list("build"));
        assert_eq!(acc.merge(record(json!({"nextHref": null}))), None);
        assert_eq!(acc.merge(record(json!({"nextHref": ""}))), Some(String::new()));
    }

    #[tokio::test]
    async fn test_accumulate_follows_next_tokens() {
        let mut seen = Vec::new();
        let merged = accumulate(MergeSchema::list("build"), |token| {
            seen.push(token.clone());
            let page = match token {
                PageToken::First => json!({"count": 1, "build": [{"id": 1}], "nextHref": "/page2"}),
                PageToken::Next(ref href) if href == "/page2" => {
                    json!({"count": 1, "build": [{"id": 2}], "nextHref": "/page3"})
                }
                PageToken::Next(_) => json!({"count": 1, "build": [{"id": 3}]}),
            };
            async move { Ok(record(page)) }
        })
        .await
        .expect("accumulate");

        assert_eq!(
            seen,
            vec![
                PageToken::First,
                PageToken::Next("/page2".to_string()),
                PageToken::Next("/page3".to_string()),
            ]
        );
        assert_eq!(merged.pages(), 3);
        assert_eq!(merged.summary().count, Some(3));
        assert_eq!(merged.collection("build").len(), 3);
    }

    #[tokio::test]
    async fn test_accumulate_fails_fast() {
        let mut calls = 0;
        let result = accumulate(MergeSchema::list("build"), |token| {
            calls += 1;
            async move {
                match token {
                    PageToken::First => Ok(record(json!({"count": 1, "nextHref": "/next"}))),
                    PageToken::Next(_) => Err(Error::InvalidSlice),
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::InvalidSlice)));
        assert_eq!(calls, 2);
    }
}
