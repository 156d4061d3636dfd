//! ormfilter - ORM-style `where` queries over in-memory collections.
//!
//! Items are dynamic [`Value`]s (usually converted from `serde_json`). A query
//! describes constraints per field in the same nested shape an ORM accepts:
//!
//! - Scalar operators: `equals`, `not`, `in`, `notIn`, `lt`/`lte`/`gt`/`gte`,
//!   string matching, `regex`, date ranges and `isNull`
//! - Array operators: `some`, `none`, `every`, `has`, `hasEvery`, `hasSome`,
//!   `length`
//! - Logical groups: `AND`, `OR`, `NOT`, nestable to any depth
//! - Relation fragments for object-valued fields
//! - `distinct`, multi-key `orderBy` and 1-based pagination
//!
//! # Quick Start
//!
//! ```rust
//! use ormfilter::{find_many, FilterQuery, Value};
//! use serde_json::json;
//!
//! let users: Vec<Value> = [
//!     json!({"name": "Alice", "age": 31, "tags": ["admin", "ops"]}),
//!     json!({"name": "Bob", "age": 25, "tags": []}),
//!     json!({"name": "Carol", "age": 40, "tags": ["ops"]}),
//! ]
//! .into_iter()
//! .map(Value::from)
//! .collect();
//!
//! let query: FilterQuery = serde_json::from_value(json!({
//!     "where": {
//!         "age": {"gte": 30},
//!         "tags": {"some": {"equals": "ops"}},
//!         "NOT": {"name": {"startsWith": "c", "mode": "insensitive"}},
//!     },
//!     "orderBy": {"age": "desc"},
//!     "pagination": {"page": 1, "size": 10},
//! }))
//! .unwrap();
//!
//! let result = find_many(&query, &users).unwrap();
//! assert_eq!(result.data.len(), 1);
//! assert_eq!(result.data[0].get("name"), &Value::from("Alice"));
//! ```
//!
//! # Query Semantics
//!
//! Keys of one fragment combine with AND. The logical groups combine their
//! fragments as follows:
//!
//! ```text
//! AND: every fragment matches          (empty = trivially satisfied)
//! OR:  at least one fragment matches   (empty = never satisfied)
//! NOT: no fragment matches             (empty = trivially satisfied)
//! ```
//!
//! Evaluation never fails. An unknown operator or unusable operand compiles
//! to a unit that never matches and is reported as a [`Diagnostic`]; the only
//! error is invalid pagination.
//!
//! Queries are compiled per call and evaluated recursively. Neither the
//! nesting depth of a query nor the size of a collection is bounded.

mod compare;
mod date;
mod error;
mod logical;
mod op;
mod ordering;
mod predicate;
mod quantifier;
mod query;
mod registry;
mod value;

pub use date::Timestamp;
pub use error::{Diagnostic, FilterError, Result};
pub use op::Op;
pub use ordering::{compare_by_orderings, compare_values, Dir, OrderBy};
pub use predicate::Where;
pub use query::{find_many, find_unique, Distinct, FilterQuery, FindManyResult, PageInfo, Pagination};
pub use value::{Map, Number, Value};
