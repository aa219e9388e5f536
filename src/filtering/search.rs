//! Search filter resolution and search item collection.
//!
//! A field's [`SearchFilter`] comes from the first source that has one:
//!
//! 1. the response type's field with the same name, compared case-insensitively
//! 2. the joined relation whose registered schema declares the field
//! 3. a default `StringLike` filter typed after the joined field, if any

use chrono::NaiveDateTime;

use super::items::{KeywordSearchItem, PeriodSearchItem};
use super::resolve::FieldResolver;
use super::schema::{FieldDescriptor, JoinedRelation, SchemaDescriptor};
use super::search_type::{FieldSearchType, FieldType, SearchFilter};

/// Filter chosen for one field, plus where the field was found.
#[derive(Debug, Clone)]
pub struct ResolvedFilter<'a> {
    pub filter: SearchFilter,
    /// Declared by the response type or a joined schema
    pub declared: bool,
    pub joined: Option<(&'a JoinedRelation, &'a FieldDescriptor)>,
}

#[must_use]
pub fn resolve_search_filter<'a>(
    field: &str,
    response: Option<&SchemaDescriptor>,
    resolver: &FieldResolver<'a>,
) -> ResolvedFilter<'a> {
    let response_field = response.and_then(|r| r.find_ignore_case(field));
    let joined = resolver.find_joined_field(field);

    let filter = response_field
        .and_then(|f| f.search_filter.clone())
        .or_else(|| joined.and_then(|(_, f)| f.search_filter.clone()))
        .unwrap_or_else(|| {
            let field_type = joined.map_or(FieldType::String, |(_, f)| f.field_type.clone());
            SearchFilter::new(FieldSearchType::StringLike).with_type(field_type)
        });

    ResolvedFilter {
        filter,
        declared: response_field.is_some() || joined.is_some(),
        joined,
    }
}

/// Qualified path searched for `field`.
///
/// An explicit string path on the filter wins. Otherwise the resolver runs, and a
/// field only the response type declares is qualified with the response's table name.
#[must_use]
pub fn resolve_search_path(
    field: &str,
    filter: &SearchFilter,
    response: Option<&SchemaDescriptor>,
    resolver: &FieldResolver<'_>,
) -> Option<String> {
    if let Some(path) = filter.string_path.as_deref().filter(|p| !p.is_empty()) {
        return Some(path.to_string());
    }

    resolver.resolve(field).or_else(|| {
        response
            .filter(|r| r.find_ignore_case(field).is_some())
            .map(|r| format!("{}.{field}", r.table_name()))
    })
}

/// One keyword item per distinct resolved path, first occurrence wins.
///
/// Fields and values pair by index and are ignored unless both lists have the same
/// non-zero length. Fields that resolve to no path contribute nothing.
#[must_use]
pub fn collect_keyword_items(
    search_fields: &[String],
    search_values: &[String],
    separator: char,
    response: Option<&SchemaDescriptor>,
    resolver: &FieldResolver<'_>,
) -> Vec<KeywordSearchItem> {
    if search_fields.is_empty() || search_fields.len() != search_values.len() {
        return Vec::new();
    }

    let mut items: Vec<KeywordSearchItem> = Vec::new();
    for (field, value) in search_fields.iter().zip(search_values) {
        let resolved = resolve_search_filter(field, response, resolver);
        let Some(path) = resolve_search_path(field, &resolved.filter, response, resolver) else {
            tracing::debug!(field = %field, "No column path for search field");
            continue;
        };

        if items.iter().any(|item| item.field == path) {
            continue;
        }

        items.push(KeywordSearchItem {
            alias_name: field.clone(),
            field: path,
            keywords: value.split(separator).map(str::to_string).collect(),
            search_type: resolved.filter.search_type,
            convert_type: resolved.filter.field_type,
        });
    }

    items
}

/// Period items for the request, deduplicated by path.
///
/// Undeclared fields and fields without both bounds are skipped. A declared field
/// whose filter is not `Date` abandons every period item.
#[must_use]
pub fn collect_period_items(
    period_fields: &[String],
    start_dates: &[NaiveDateTime],
    end_dates: &[NaiveDateTime],
    response: Option<&SchemaDescriptor>,
    resolver: &FieldResolver<'_>,
) -> Vec<PeriodSearchItem> {
    if period_fields.is_empty() || start_dates.is_empty() || end_dates.is_empty() {
        return Vec::new();
    }

    let mut items: Vec<PeriodSearchItem> = Vec::new();
    for (index, field) in period_fields.iter().enumerate() {
        let (Some(start), Some(end)) = (start_dates.get(index), end_dates.get(index)) else {
            tracing::debug!(field = %field, "Period field without matching bounds");
            continue;
        };

        let resolved = resolve_search_filter(field, response, resolver);
        if !resolved.declared {
            continue;
        }
        if resolved.filter.search_type != FieldSearchType::Date {
            tracing::debug!(field = %field, "Period search on a non-date field, dropping all periods");
            return Vec::new();
        }

        let Some(path) = resolve_search_path(field, &resolved.filter, response, resolver) else {
            tracing::debug!(field = %field, "No column path for period field");
            continue;
        };
        if items.iter().any(|item| item.field == path) {
            continue;
        }

        let Some(item) = PeriodSearchItem::new(path, *start, *end, resolved.filter.date_only) else {
            tracing::warn!(field = %field, end = %end, "Period end out of range");
            continue;
        };
        items.push(item);
    }

    items
}
