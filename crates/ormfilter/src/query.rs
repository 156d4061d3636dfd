//! Query orchestration: filter, dedup, sort and paginate a collection.
//!
//! A [`FilterQuery`] is either deserialized from its structured shape
//!
//! ```text
//! { where, orderBy?, distinct?, pagination?: { page, size } }
//! ```
//!
//! or assembled with the builder methods. [`find_many`] runs the whole
//! pipeline; [`find_unique`] only looks for the first match.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{Diagnostic, FilterError, Result};
use crate::ordering::{compare_by_orderings, OrderBy};
use crate::predicate::Where;
use crate::value::{Structural, Value};

/// A query against an in-memory collection.
///
/// # Example
///
/// ```
/// use ormfilter::{find_many, FilterQuery, Value};
/// use serde_json::json;
///
/// let query = FilterQuery::new(json!({"age": {"gte": 30}}))
///     .order_desc("age")
///     .paginate(1, 10);
/// let people: Vec<Value> = [json!({"age": 25}), json!({"age": 30}), json!({"age": 35})]
///     .into_iter()
///     .map(Value::from)
///     .collect();
///
/// let result = find_many(&query, &people).unwrap();
/// assert_eq!(result.data, vec![Value::from(json!({"age": 35})), Value::from(json!({"age": 30}))]);
/// assert_eq!(result.pagination.unwrap().total_items, 2);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    /// The `where` fragment. Null or missing matches everything.
    #[serde(rename = "where", default)]
    pub where_clause: Value,
    /// Page to return. `None` returns every match.
    #[serde(default)]
    pub pagination: Option<Pagination>,
    /// Sort keys, primary first.
    #[serde(default, deserialize_with = "deserialize_order_by")]
    pub order_by: Vec<OrderBy>,
    /// Deduplication applied before sorting.
    #[serde(default)]
    pub distinct: Distinct,
}

impl FilterQuery {
    /// Creates a query with the given `where` fragment.
    pub fn new(where_clause: impl Into<Value>) -> Self {
        FilterQuery {
            where_clause: where_clause.into(),
            ..FilterQuery::default()
        }
    }

    /// Appends a sort key.
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    /// Appends an ascending sort key.
    pub fn order_asc(self, field: impl Into<String>) -> Self {
        self.order_by(OrderBy::asc(field))
    }

    /// Appends a descending sort key.
    pub fn order_desc(self, field: impl Into<String>) -> Self {
        self.order_by(OrderBy::desc(field))
    }

    /// Drops items structurally equal to an earlier match.
    pub fn distinct(mut self) -> Self {
        self.distinct = Distinct::All;
        self
    }

    /// Drops items whose named fields all equal those of an earlier match.
    pub fn distinct_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.distinct = Distinct::from_fields(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Requests a 1-based page of `size` items.
    pub fn paginate(mut self, page: i64, size: i64) -> Self {
        self.pagination = Some(Pagination { page, size });
        self
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: i64,
    /// Items per page, at least 1.
    pub size: i64,
}

impl Pagination {
    fn validate(self) -> Result<()> {
        if self.page < 1 || self.size < 1 {
            return Err(FilterError::InvalidPagination {
                page: self.page,
                size: self.size,
            });
        }
        Ok(())
    }

    // Only called after `validate`, so both conversions succeed.
    fn bounds(self) -> (usize, usize) {
        let page = usize::try_from(self.page - 1).unwrap_or(usize::MAX);
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        (page.saturating_mul(size), size)
    }
}

/// Deduplication of matched items.
///
/// Deserializes from `true`/`false`, a field name, or a list of field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "DistinctRepr")]
pub enum Distinct {
    /// Keep every match.
    #[default]
    Off,
    /// Whole items, by structural equality.
    All,
    /// The listed fields (dotted paths allowed), by structural equality.
    Fields(Vec<String>),
}

impl Distinct {
    fn from_fields(fields: Vec<String>) -> Self {
        if fields.is_empty() {
            Distinct::Off
        } else {
            Distinct::Fields(fields)
        }
    }

    fn apply<'a>(&self, rows: Vec<&'a Value>) -> Vec<&'a Value> {
        match self {
            Distinct::Off => rows,
            Distinct::All => {
                let mut seen = HashSet::new();
                rows.into_iter()
                    .filter(|&row| seen.insert(Structural(row)))
                    .collect()
            }
            Distinct::Fields(fields) => {
                let mut seen = HashSet::new();
                rows.into_iter()
                    .filter(|&row| {
                        let key: Vec<_> = fields.iter().map(|f| Structural(row.path(f))).collect();
                        seen.insert(key)
                    })
                    .collect()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistinctRepr {
    Unset,
    Flag(bool),
    Field(String),
    Fields(Vec<String>),
}

impl From<DistinctRepr> for Distinct {
    fn from(repr: DistinctRepr) -> Self {
        match repr {
            DistinctRepr::Unset | DistinctRepr::Flag(false) => Distinct::Off,
            DistinctRepr::Flag(true) => Distinct::All,
            DistinctRepr::Field(field) => Distinct::Fields(vec![field]),
            DistinctRepr::Fields(fields) => Distinct::from_fields(fields),
        }
    }
}

// `{a: 'asc', b: 'desc'}` in document order, or `[{a: 'asc'}, {b: 'desc'}]`.
fn deserialize_order_by<'de, D>(deserializer: D) -> std::result::Result<Vec<OrderBy>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(OrderByVisitor)
}

struct OrderByList(Vec<OrderBy>);

impl<'de> Deserialize<'de> for OrderByList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_order_by(deserializer).map(OrderByList)
    }
}

struct OrderByVisitor;

impl<'de> Visitor<'de> for OrderByVisitor {
    type Value = Vec<OrderBy>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field to 'asc'/'desc', or a list of such maps")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut orderings = Vec::new();
        while let Some((field, dir)) = map.next_entry::<String, _>()? {
            orderings.push(OrderBy::new(field, dir));
        }
        Ok(orderings)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
        let mut orderings = Vec::new();
        while let Some(OrderByList(entries)) = seq.next_element()? {
            orderings.extend(entries);
        }
        Ok(orderings)
    }
}

/// Output of [`find_many`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyResult {
    /// Matching items, deduplicated, sorted and paged.
    pub data: Vec<Value>,
    /// Present only when the query asked for a page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
    /// Problems found in the `where` fragment, plus relation filters that
    /// met non-object values (see [`Where::check_shapes`]).
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Requested page.
    pub page: i64,
    /// Requested page size.
    pub size: i64,
    /// Matches after `distinct`, across all pages.
    pub total_items: usize,
    /// `ceil(total_items / size)`; 0 when nothing matched.
    pub total_pages: usize,
    /// A later page holds items.
    pub has_next: bool,
    /// `page > 1`.
    pub has_prev: bool,
}

/// Runs a query: filter, then `distinct`, then `orderBy`, then pagination.
///
/// Filtering is a linear scan; nothing bounds the nesting depth of the
/// `where` fragment or the size of the collection.
///
/// # Errors
///
/// Returns [`FilterError::InvalidPagination`] if `page` or `size` is below 1.
/// Malformed `where` fragments are never an error; they show up in
/// [`FindManyResult::diagnostics`].
pub fn find_many(query: &FilterQuery, items: &[Value]) -> Result<FindManyResult> {
    if let Some(pagination) = query.pagination {
        pagination.validate()?;
    }

    let filter = Where::compile(&query.where_clause);
    let matched = filter.filter(items);
    let matched_count = matched.len();

    let mut rows = query.distinct.apply(matched);
    if !query.order_by.is_empty() {
        rows.sort_by(|a, b| compare_by_orderings(a, b, &query.order_by));
    }
    debug!(
        scanned = items.len(),
        matched = matched_count,
        distinct = rows.len(),
        "where clause evaluated"
    );

    let mut diagnostics = filter.diagnostics().to_vec();
    diagnostics.extend(filter.check_shapes(items));
    let Some(pagination) = query.pagination else {
        return Ok(FindManyResult {
            data: rows.into_iter().cloned().collect(),
            pagination: None,
            diagnostics,
        });
    };

    let total_items = rows.len();
    let (start, size) = pagination.bounds();
    let data: Vec<Value> = rows.into_iter().skip(start).take(size).cloned().collect();
    debug!(
        page = pagination.page,
        size = pagination.size,
        returned = data.len(),
        "page sliced"
    );

    Ok(FindManyResult {
        data,
        pagination: Some(PageInfo {
            page: pagination.page,
            size: pagination.size,
            total_items,
            total_pages: total_items.div_ceil(size),
            has_next: start.saturating_add(size) < total_items,
            has_prev: pagination.page > 1,
        }),
        diagnostics,
    })
}

/// Returns the first item matching the `where` fragment, in input order.
///
/// `orderBy`, `distinct` and `pagination` are ignored.
pub fn find_unique(query: &FilterQuery, items: &[Value]) -> Option<Value> {
    let filter = Where::compile(&query.where_clause);
    items.iter().find(|item| filter.matches(item)).cloned()
}
