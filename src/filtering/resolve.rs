//! Field path resolution.
//!
//! A logical field name is turned into a qualified `table.field` path by trying,
//! first match wins:
//!
//! 1. a dot-qualified scan of the projection text for `.field`
//! 2. an alias scan of the projection text for `as field`
//! 3. the joined relations' registered schemas
//! 4. a configured default table

use sea_orm::sea_query::{Alias, Expr};

use super::schema::{ColumnMapping, FieldDescriptor, JoinedRelation};

/// Resolves field names against one query's projection and joins.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    projection: &'a [String],
    joins: &'a [JoinedRelation],
    default_table: Option<&'a str>,
}

impl<'a> FieldResolver<'a> {
    #[must_use]
    pub const fn new(projection: &'a [String], joins: &'a [JoinedRelation]) -> Self {
        Self {
            projection,
            joins,
            default_table: None,
        }
    }

    #[must_use]
    pub const fn with_default_table(mut self, table: Option<&'a str>) -> Self {
        self.default_table = table;
        self
    }

    #[must_use]
    pub const fn projection(&self) -> &'a [String] {
        self.projection
    }

    #[must_use]
    pub const fn joins(&self) -> &'a [JoinedRelation] {
        self.joins
    }

    /// Whether any projected expression mentions `field`
    #[must_use]
    pub fn projection_contains(&self, field: &str) -> bool {
        self.projection.iter().any(|expression| expression.contains(field))
    }

    /// `qualifier.field` taken from the first projected expression containing `.field`
    #[must_use]
    pub fn find_dot_statement(&self, field: &str) -> Option<String> {
        if field.is_empty() {
            return None;
        }
        let needle = format!(".{field}");
        let expression = self.projection.iter().find(|e| e.contains(&needle))?;
        let qualifier = expression.split('.').next().unwrap_or_default().trim();
        if qualifier.is_empty() {
            tracing::debug!(field = %field, expression = %expression, "Projection match has no qualifier");
            return None;
        }
        Some(format!("{qualifier}.{field}").replace('+', ""))
    }

    /// Alias of the first projected expression containing `as field`
    #[must_use]
    pub fn find_alias_statement(&self, field: &str) -> Option<String> {
        if field.is_empty() {
            return None;
        }
        let needle = format!("as {field}");
        let expression = self.projection.iter().find(|e| e.contains(&needle))?;
        let alias = expression.rsplit("as ").next().unwrap_or_default().trim();
        (!alias.is_empty()).then(|| alias.to_string())
    }

    /// First joined relation whose schema declares (or contains) `field`
    #[must_use]
    pub fn find_joined_field(&self, field: &str) -> Option<(&'a JoinedRelation, &'a FieldDescriptor)> {
        self.joins.iter().find_map(|relation| {
            relation
                .schema
                .find_matching(field)
                .map(|descriptor| (relation, descriptor))
        })
    }

    /// `target.field` for the first joined relation declaring `field`
    #[must_use]
    pub fn find_joined_statement(&self, field: &str) -> Option<String> {
        self.find_joined_field(field)
            .map(|(relation, _)| format!("{}.{field}", relation.target))
    }

    #[must_use]
    pub fn find_default_statement(&self, field: &str) -> Option<String> {
        match self.default_table {
            Some(table) if !table.is_empty() && !field.is_empty() => Some(format!("{table}.{field}")),
            _ => None,
        }
    }

    /// Run every strategy in order
    #[must_use]
    pub fn resolve(&self, field: &str) -> Option<String> {
        self.find_dot_statement(field)
            .or_else(|| self.find_alias_statement(field))
            .or_else(|| self.find_joined_statement(field))
            .or_else(|| self.find_default_statement(field))
    }
}

/// Map a requested sort field through a table to columns lookup.
///
/// Plain column lists match when a column contains `field`. Alias lists match on
/// the alias name and yield the real field name. The first table that matches
/// qualifies the result, otherwise `default_table` does.
#[must_use]
pub fn get_field_path(
    default_table: &str,
    mappings: &[(&str, ColumnMapping)],
    field: &str,
) -> String {
    let qualify = |table: &str, column: &str| {
        if table.is_empty() {
            column.to_string()
        } else {
            format!("{table}.{column}")
        }
    };

    for (table, mapping) in mappings {
        match mapping {
            ColumnMapping::Fields(columns) => {
                if columns.iter().any(|column| column.contains(field)) {
                    return qualify(table, field);
                }
            }
            ColumnMapping::Aliases(aliases) => {
                if let Some(alias) = aliases.iter().find(|a| a.alias_name == field) {
                    return qualify(table, &alias.field_name);
                }
            }
        }
    }

    qualify(default_table, field)
}

/// Column expression for a resolved path.
///
/// `table.field` becomes a qualified column and `table.sub.sub2` keeps `sub.sub2` as
/// the column name. Empty segments make the path unusable.
#[must_use]
pub fn column_expr(path: &str) -> Option<Expr> {
    let (table, column) = match path.split_once('.') {
        Some((table, column)) => (Some(table.trim()), column.trim()),
        None => (None, path.trim()),
    };

    if column.is_empty() || table.is_some_and(str::is_empty) || column.split('.').any(str::is_empty) {
        tracing::warn!(path = %path, "Ignoring malformed column path");
        return None;
    }

    Some(match table {
        Some(table) => Expr::col((Alias::new(table), Alias::new(column))),
        None => Expr::col(Alias::new(column)),
    })
}
