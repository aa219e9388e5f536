//! # Search & Sort Resolution
//!
//! Turns loosely typed request parameters into sea-query conditions and ordering
//! clauses for a [`QuerySource`](crate::QuerySource).
//!
//! ## Main Components
//!
//! - **[`resolve`]**: maps a logical field name to a qualified `table.field` path
//! - **[`search`]**: picks the [`SearchFilter`] for a field and collects keyword and period items
//! - **[`conditions`]**: builds the per-type predicates and combines them
//! - **[`sort`]**: pairs order fields with directions and resolves orderable statements
//! - **[`schema`]**: statically registered field tables for response types and joined entities
//!
//! ## Combining
//!
//! Keyword predicates are OR'd into one group and period ranges into another. Both
//! groups are AND'd with any explicit caller conditions:
//!
//! ```text
//! others AND (status IN ('ACTIVE') OR name LIKE '%john%') AND (joined_at >= .. AND joined_at < ..)
//! ```

pub mod conditions;
pub mod items;
pub mod resolve;
pub mod schema;
pub mod search;
pub mod search_type;
pub mod sort;

pub use conditions::{build_keyword_group, build_period_group, combine_conditions};
pub use items::{KeywordSearchItem, PeriodSearchItem, SortDirection, SortItem};
pub use resolve::{FieldResolver, get_field_path};
pub use schema::{ColumnAlias, ColumnMapping, FieldDescriptor, JoinedRelation, SchemaDescriptor};
pub use search::{collect_keyword_items, collect_period_items, resolve_search_filter};
pub use search_type::{EnumDescriptor, FieldSearchType, FieldType, SearchFilter, parse_boolean};
pub use sort::{build_sort_items, get_sort_orders, order_by_with_direction};
