use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use sea_orm::sea_query::Order;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::search_type::{FieldSearchType, FieldType};

/// Ordering direction. Only a case-insensitive `desc` parses as descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested ordering, optionally qualified by table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortItem {
    pub table: Option<String>,
    pub field: String,
    pub direction: SortDirection,
    /// Type name the sort was resolved for, if any
    pub class: Option<String>,
}

impl SortItem {
    /// Build from a possibly dotted field.
    ///
    /// `table.field` splits into table and field, `table.sub.sub2` keeps `sub.sub2`
    /// as the field. Deeper paths are not representable and leave the field empty.
    #[must_use]
    pub fn new(field: &str, direction: &str) -> Self {
        let parts: Vec<&str> = field.split('.').collect();
        let (table, field) = match parts.as_slice() {
            [field] => (None, (*field).to_string()),
            [table, field] => (Some((*table).to_string()), (*field).to_string()),
            [table, sub, sub2] => (Some((*table).to_string()), format!("{sub}.{sub2}")),
            _ => (None, String::new()),
        };

        Self {
            table,
            field,
            direction: SortDirection::parse(direction),
            class: None,
        }
    }

    #[must_use]
    pub fn with_table(table: impl Into<String>, field: impl Into<String>, direction: &str) -> Self {
        Self {
            table: Some(table.into()),
            field: field.into(),
            direction: SortDirection::parse(direction),
            class: None,
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn set_direction(&mut self, direction: &str) {
        self.direction = SortDirection::parse(direction);
    }

    /// `table.field`, or just `field` when unqualified
    #[must_use]
    pub fn path(&self) -> String {
        match &self.table {
            Some(table) if !table.is_empty() => format!("{table}.{}", self.field),
            _ => self.field.clone(),
        }
    }
}

impl fmt::Display for SortItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path(), self.direction)
    }
}

/// Keyword search against one resolved column path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSearchItem {
    pub alias_name: String,
    /// Resolved qualified path
    pub field: String,
    pub keywords: Vec<String>,
    pub search_type: FieldSearchType,
    pub convert_type: FieldType,
}

/// Period search over a half-open `[start, end)` range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSearchItem {
    pub field: String,
    pub date_only: bool,
    pub search_start_date: NaiveDateTime,
    pub search_end_date: NaiveDateTime,
}

impl PeriodSearchItem {
    /// Normalizes inclusive user bounds to an exclusive end.
    ///
    /// Date-only periods start at midnight and end at midnight of the day after
    /// `end`. Otherwise the end is pushed one second forward. Returns `None` when
    /// the pushed end falls outside the representable range.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        date_only: bool,
    ) -> Option<Self> {
        let (search_start_date, search_end_date) = if date_only {
            (
                start.date().and_time(NaiveTime::MIN),
                end.date()
                    .and_time(NaiveTime::MIN)
                    .checked_add_signed(TimeDelta::days(1))?,
            )
        } else {
            (start, end.checked_add_signed(TimeDelta::seconds(1))?)
        };

        Some(Self {
            field: field.into(),
            date_only,
            search_start_date,
            search_end_date,
        })
    }
}

impl fmt::Display for PeriodSearchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.date_only {
            write!(
                f,
                "{}='{}' ~ '{}'",
                self.field,
                self.search_start_date.date(),
                (self.search_end_date - TimeDelta::days(1)).date()
            )
        } else {
            write!(
                f,
                "{}='{}' ~ '{}'",
                self.field,
                self.search_start_date,
                self.search_end_date - TimeDelta::seconds(1)
            )
        }
    }
}
