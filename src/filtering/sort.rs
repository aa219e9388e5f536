use sea_orm::sea_query::SimpleExpr;

use super::items::{SortDirection, SortItem};
use super::resolve::{FieldResolver, column_expr, get_field_path};
use super::schema::ColumnMapping;
use crate::source::QuerySource;

/// Pair order fields with directions by index.
///
/// Missing directions, including an absent direction list, default to ascending.
#[must_use]
pub fn build_sort_items(order_fields: &[String], order_directions: &[String]) -> Vec<SortItem> {
    order_fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            SortItem::new(field, order_directions.get(index).map_or("asc", String::as_str))
        })
        .collect()
}

fn find_sort_statement_for_dot(resolver: &FieldResolver<'_>, sort: &SortItem) -> Option<String> {
    resolver.find_dot_statement(&sort.field)
}

/// The alias of an aliased projection is located but cannot be ordered on, so
/// this strategy never yields a statement.
fn find_sort_statement_for_alias(resolver: &FieldResolver<'_>, sort: &SortItem) -> Option<String> {
    if let Some(alias) = resolver.find_alias_statement(&sort.field) {
        tracing::trace!(field = %sort.field, alias = %alias, "Alias match ignored for ordering");
    }
    None
}

fn find_sort_statement_from_joins(resolver: &FieldResolver<'_>, sort: &SortItem) -> Option<String> {
    resolver.find_joined_statement(&sort.field)
}

/// Orderable statement for one sort item, or `None` when every strategy fails
#[must_use]
pub fn resolve_sort_statement(resolver: &FieldResolver<'_>, sort: &SortItem) -> Option<String> {
    find_sort_statement_for_dot(resolver, sort)
        .or_else(|| find_sort_statement_for_alias(resolver, sort))
        .or_else(|| find_sort_statement_from_joins(resolver, sort))
}

/// Resolve every sort item, silently dropping those with no statement
#[must_use]
pub fn resolve_sort_statements(
    resolver: &FieldResolver<'_>,
    sorts: &[SortItem],
) -> Vec<(String, SortDirection)> {
    sorts
        .iter()
        .filter_map(|sort| {
            let statement = resolve_sort_statement(resolver, sort);
            if statement.is_none() {
                tracing::debug!(field = %sort.field, "Dropping unresolvable sort field");
            }
            statement.map(|statement| (statement, sort.direction))
        })
        .collect()
}

/// Apply resolved `(path, direction)` pairs in order
#[must_use]
pub fn apply_order_by<Q: QuerySource>(mut query: Q, statements: &[(String, SortDirection)]) -> Q {
    for (path, direction) in statements {
        if let Some(column) = column_expr(path) {
            query = query.order_by(SimpleExpr::from(column), (*direction).into());
        }
    }
    query
}

/// Order by sort items as given, `table.field` or `field`, skipping empty fields
#[must_use]
pub fn order_by_with_direction<Q: QuerySource>(mut query: Q, orders: &[SortItem]) -> Q {
    for order in orders.iter().filter(|o| !o.field.is_empty()) {
        if let Some(column) = column_expr(&order.path()) {
            query = query.order_by(SimpleExpr::from(column), order.direction.into());
        }
    }
    query
}

/// Sort items for an explicit table to columns mapping.
///
/// With no order fields the `default_items` are returned. Otherwise fields pair with
/// directions as in [`build_sort_items`] and each is mapped through
/// [`get_field_path`], tagged with `class` when given.
#[must_use]
pub fn get_sort_orders(
    class: Option<&str>,
    default_table: &str,
    mappings: &[(&str, ColumnMapping)],
    order_fields: &[String],
    order_directions: &[String],
    default_items: &[SortItem],
) -> Vec<SortItem> {
    if order_fields.is_empty() {
        return default_items.to_vec();
    }

    build_sort_items(order_fields, order_directions)
        .into_iter()
        .zip(order_fields)
        .map(|(paired, field)| {
            let item = SortItem::new(
                &get_field_path(default_table, mappings, field),
                paired.direction.as_str(),
            );
            match class {
                Some(class) => item.with_class(class),
                None => item,
            }
        })
        .collect()
}
