use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};

use super::items::{KeywordSearchItem, PeriodSearchItem};
use super::resolve::column_expr;
use super::search_type::{FieldSearchType, FieldType, parse_boolean};
use crate::errors::QueryError;

/// Build the predicate for one keyword item.
///
/// Returns `Ok(None)` when the item cannot contribute, e.g. an unusable path or a
/// keyword that does not convert to the declared number type.
///
/// # Errors
///
/// Enum searches fail when a keyword is not a member of the declared enum, or when
/// the field declares no enum at all.
pub fn build_keyword_condition(item: &KeywordSearchItem) -> Result<Option<SimpleExpr>, QueryError> {
    let Some(column) = column_expr(&item.field) else {
        return Ok(None);
    };
    let Some(first) = item.keywords.first() else {
        return Ok(None);
    };

    let expr = match item.search_type {
        FieldSearchType::StringEqual => column.eq(first.as_str()),
        FieldSearchType::Number => {
            let Some(keyword) = convert_number(first, &item.convert_type) else {
                tracing::warn!(field = %item.field, keyword = %first, "Keyword is not a number");
                return Ok(None);
            };
            Expr::expr(Expr::cast_as(column, Alias::new("TEXT"))).like(keyword)
        }
        FieldSearchType::Boolean => column.eq(parse_boolean(first)),
        FieldSearchType::Enum => column.is_in(enum_members(item)?),
        FieldSearchType::List => column.is_in(item.keywords.clone()),
        FieldSearchType::BooleanList => {
            column.is_in(item.keywords.iter().map(|k| parse_boolean(k)).collect::<Vec<_>>())
        }
        FieldSearchType::PhoneNo => {
            let stripped = Func::cust(Alias::new("REPLACE"))
                .arg(column)
                .arg(Expr::val("-"))
                .arg(Expr::val(""));
            Expr::expr(stripped).like(format!("%{}%", first.replace('-', "")))
        }
        FieldSearchType::StringLike | FieldSearchType::Date => column.like(format!("%{first}%")),
    };

    Ok(Some(expr))
}

/// Validate every keyword against the declared enum and return the member names
fn enum_members(item: &KeywordSearchItem) -> Result<Vec<String>, QueryError> {
    let FieldType::Enum(descriptor) = &item.convert_type else {
        return Err(QueryError::undeclared_enum(&item.alias_name));
    };

    item.keywords
        .iter()
        .map(|keyword| {
            let keyword = keyword.trim();
            descriptor
                .member(keyword)
                .map(str::to_string)
                .ok_or_else(|| QueryError::invalid_enum_value(&item.alias_name, keyword, &descriptor.name))
        })
        .collect()
}

/// Normalize a numeric keyword to the declared number type
fn convert_number(keyword: &str, convert_type: &FieldType) -> Option<String> {
    let keyword = keyword.trim();
    match convert_type {
        FieldType::Integer => keyword.parse::<i64>().ok().map(|n| n.to_string()),
        FieldType::Decimal => keyword.parse::<f64>().ok().map(|_| keyword.to_string()),
        _ => (!keyword.is_empty()).then(|| keyword.to_string()),
    }
}

/// OR every keyword predicate into one group
///
/// # Errors
///
/// Propagates enum validation failures from [`build_keyword_condition`].
pub fn build_keyword_group(items: &[KeywordSearchItem]) -> Result<Option<Condition>, QueryError> {
    let mut group = Condition::any();
    let mut added = false;
    for item in items {
        if let Some(expr) = build_keyword_condition(item)? {
            group = group.add(expr);
            added = true;
        }
    }
    Ok(added.then_some(group))
}

/// `field >= start AND field < end`
#[must_use]
pub fn build_period_condition(item: &PeriodSearchItem) -> Option<SimpleExpr> {
    let column = column_expr(&item.field)?;
    Some(
        column
            .clone()
            .gte(item.search_start_date)
            .and(column.lt(item.search_end_date)),
    )
}

/// OR every period range into one group
#[must_use]
pub fn build_period_group(items: &[PeriodSearchItem]) -> Option<Condition> {
    let exprs: Vec<SimpleExpr> = items.iter().filter_map(build_period_condition).collect();
    if exprs.is_empty() {
        return None;
    }
    Some(exprs.into_iter().fold(Condition::any(), Condition::add))
}

/// AND the caller's conditions with the keyword and period groups
#[must_use]
pub fn combine_conditions(
    others: &[Condition],
    keyword_group: Option<Condition>,
    period_group: Option<Condition>,
) -> Condition {
    others
        .iter()
        .cloned()
        .chain(keyword_group)
        .chain(period_group)
        .fold(Condition::all(), Condition::add)
}
