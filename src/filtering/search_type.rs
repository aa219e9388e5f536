use sea_orm::ColumnType;
use serde::{Deserialize, Serialize};

/// How a search keyword is matched against a column.
///
/// Discriminators are grouped by magnitude: strings in the single digits, scalars in
/// the twenties, collections in the thirties, dates at 41 and phone numbers at 51.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum FieldSearchType {
    /// `LIKE '%keyword%'` on the first keyword
    #[default]
    StringLike = 1,
    /// Equality on the first keyword
    StringEqual = 2,
    /// Textual `LIKE` on a numeric column, keyword converted first
    Number = 21,
    /// Equality against a parsed boolean
    Boolean = 22,
    /// `IN` over keywords validated against an enum
    Enum = 31,
    /// `IN` over the raw keywords
    List = 32,
    /// `IN` over keywords parsed as booleans
    BooleanList = 33,
    /// Half-open period range
    Date = 41,
    /// Dash-insensitive contains match
    PhoneNo = 51,
}

impl FieldSearchType {
    #[must_use]
    pub const fn value(self) -> i32 {
        self as i32
    }
}

/// Declared members of an enum column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumDescriptor {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the matching member name, case-sensitive
    #[must_use]
    pub fn member(&self, value: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|variant| variant.as_str() == value)
            .map(String::as_str)
    }
}

/// Value-conversion type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Enum(EnumDescriptor),
}

impl FieldType {
    /// Map a sea-orm column type onto the conversion type used by searches
    #[must_use]
    pub fn from_column_type(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => Self::Decimal,
            ColumnType::Boolean => Self::Boolean,
            ColumnType::DateTime
            | ColumnType::Timestamp
            | ColumnType::TimestampWithTimeZone
            | ColumnType::Date => Self::DateTime,
            _ => Self::String,
        }
    }
}

/// Declarative search metadata attached to a schema or response field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub field_type: FieldType,
    /// Explicit qualified path, bypassing path resolution when set
    pub string_path: Option<String>,
    pub search_type: FieldSearchType,
    pub date_only: bool,
}

impl SearchFilter {
    #[must_use]
    pub const fn new(search_type: FieldSearchType) -> Self {
        Self {
            field_type: FieldType::String,
            string_path: None,
            search_type,
            date_only: true,
        }
    }

    /// A period filter; `date_only` truncates bounds to whole days
    #[must_use]
    pub const fn date(date_only: bool) -> Self {
        Self {
            field_type: FieldType::DateTime,
            string_path: None,
            search_type: FieldSearchType::Date,
            date_only,
        }
    }

    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    #[must_use]
    pub fn with_string_path(mut self, path: impl Into<String>) -> Self {
        self.string_path = Some(path.into());
        self
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new(FieldSearchType::StringLike)
    }
}

/// Lenient boolean parsing used by boolean searches.
///
/// `0`, `n`, `no`, `false` are false and `1`, `y`, `yes`, `true` are true, letters
/// compared case-insensitively. Anything else has no boolean meaning.
#[must_use]
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value {
        "0" => Some(false),
        "1" => Some(true),
        v if ["n", "no", "false"].iter().any(|f| v.eq_ignore_ascii_case(f)) => Some(false),
        v if ["y", "yes", "true"].iter().any(|t| v.eq_ignore_ascii_case(t)) => Some(true),
        _ => None,
    }
}
