use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for searching, sorting and paging a resource.
///
/// Every list is optional and comma-separated on the query string. Lists pair up by
/// index: `search_fields[i]` is searched for `search_values[i]`, `order_fields[i]`
/// is sorted by `order_directions[i]`, and `search_period_fields[i]` is bounded by
/// `search_start_dates[i]` and `search_end_dates[i]`.
///
/// # Searching
/// A search value may hold several keywords separated by `;`. Most search types only
/// use the first keyword, list and enum searches use all of them:
/// ```text
/// ?search_fields=status,name&search_values=ACTIVE;PENDING,john
/// ```
///
/// # Sorting
/// Directions are `asc` or `desc`. Missing directions default to ascending:
/// ```text
/// ?order_fields=score,name&order_directions=desc
/// ```
///
/// # Paging
/// `skip` rows are skipped and at most `count_per_page` rows are returned:
/// ```text
/// ?skip=40&count_per_page=20
/// ```
#[serde_as]
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct RequestResources {
    /// Name of the query, for logging and callbacks.
    #[param(example = "member-list")]
    pub name: Option<String>,
    /// Only honour search and order fields that appear in the query's projection.
    #[param(example = false)]
    pub only_projections: Option<bool>,
    /// Number of rows to skip.
    #[param(example = 0)]
    pub skip: Option<u64>,
    /// Page size.
    #[param(example = 20)]
    pub count_per_page: Option<u64>,
    /// Fields to sort by.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[param(example = "score,name")]
    pub order_fields: Option<Vec<String>>,
    /// Sort directions, paired with `order_fields`.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[param(example = "desc")]
    pub order_directions: Option<Vec<String>>,
    /// Fields to search.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[param(example = "status,name")]
    pub search_fields: Option<Vec<String>>,
    /// Search values, paired with `search_fields`.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[param(example = "ACTIVE,john")]
    pub search_values: Option<Vec<String>>,
    /// Date fields to bound by a period.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[param(example = "joined_at")]
    pub search_period_fields: Option<Vec<String>>,
    /// Inclusive period starts.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, NaiveDateTime>>")]
    #[param(example = "2024-01-01T00:00:00")]
    pub search_start_dates: Option<Vec<NaiveDateTime>>,
    /// Inclusive period ends.
    #[serde(default)]
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, NaiveDateTime>>")]
    #[param(example = "2024-01-31T00:00:00")]
    pub search_end_dates: Option<Vec<NaiveDateTime>>,
}

/// Provider-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Page numbers per navigation section in paged results
    pub page_per_section: u64,
    /// Page size used when a request gives none
    pub default_count_per_page: u64,
    /// Separator between keywords of one search value
    pub keyword_separator: char,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            page_per_section: crate::pagination::DEFAULT_PAGE_PER_SECTION,
            default_count_per_page: 20,
            keyword_separator: ';',
        }
    }
}

/// Request parameters with every absent list replaced by an empty one.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SearchParameters {
    pub name: String,
    pub only_projections: bool,
    pub skip: u64,
    pub count_per_page: u64,
    pub order_fields: Vec<String>,
    pub order_directions: Vec<String>,
    pub search_fields: Vec<String>,
    pub search_values: Vec<String>,
    pub search_period_fields: Vec<String>,
    pub search_start_dates: Vec<NaiveDateTime>,
    pub search_end_dates: Vec<NaiveDateTime>,
    /// Lowercased search field to its keywords
    #[serde(skip)]
    search_field_and_values: HashMap<String, Vec<String>>,
}

impl SearchParameters {
    #[must_use]
    pub fn normalize(resources: RequestResources, config: &ProviderConfig) -> Self {
        let search_fields = resources.search_fields.unwrap_or_default();
        let search_values = resources.search_values.unwrap_or_default();

        let mut search_field_and_values: HashMap<String, Vec<String>> = HashMap::new();
        for (field, value) in search_fields.iter().zip(&search_values) {
            search_field_and_values
                .entry(field.to_lowercase())
                .or_default()
                .extend(value.split(config.keyword_separator).map(str::to_string));
        }

        Self {
            name: resources.name.unwrap_or_default(),
            only_projections: resources.only_projections.unwrap_or(false),
            skip: resources.skip.unwrap_or(0),
            count_per_page: resources
                .count_per_page
                .unwrap_or(config.default_count_per_page),
            order_fields: resources.order_fields.unwrap_or_default(),
            order_directions: resources.order_directions.unwrap_or_default(),
            search_fields,
            search_values,
            search_period_fields: resources.search_period_fields.unwrap_or_default(),
            search_start_dates: resources.search_start_dates.unwrap_or_default(),
            search_end_dates: resources.search_end_dates.unwrap_or_default(),
            search_field_and_values,
        }
    }

    /// Whether `key` was searched, case-insensitively
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.search_field_and_values.contains_key(&key.to_lowercase())
    }

    /// Keywords searched for `key`, empty when absent
    #[must_use]
    pub fn get_values(&self, key: &str) -> &[String] {
        self.search_field_and_values
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First keyword searched for `key`, empty when absent
    #[must_use]
    pub fn get_first_value(&self, key: &str) -> &str {
        self.get_values(key).first().map_or("", String::as_str)
    }
}

impl From<RequestResources> for SearchParameters {
    fn from(resources: RequestResources) -> Self {
        Self::normalize(resources, &ProviderConfig::default())
    }
}
