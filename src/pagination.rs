use axum::{
    Json,
    http::header::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer, ser::SerializeStruct};

/// `count_per_page` sentinel meaning "no limit"
pub const UNBOUNDED: u64 = u64::MAX;

/// Page numbers shown together in one navigation section
pub const DEFAULT_PAGE_PER_SECTION: u64 = 20;

/// Resource named in `Content-Range` unless set with [`QueryResults::with_resource_name`]
pub const DEFAULT_RESOURCE_NAME: &str = "items";

/// Paging metadata of a result set, independent of its item type.
pub trait Paging {
    fn total_count(&self) -> u64;
    fn skips(&self) -> u64;
    fn page_no(&self) -> u64;
    fn count_per_page(&self) -> u64;
    fn page_per_section(&self) -> u64;
    fn item_count(&self) -> usize;

    fn total_page(&self) -> u64;
    fn start_page_no(&self) -> u64;
    fn end_page_no(&self) -> u64;
    fn page_nos(&self) -> Vec<u64>;
    fn has_previous_page(&self) -> bool;
    fn has_next_page(&self) -> bool;
    fn has_previous_page_section(&self) -> bool;
    fn has_next_page_section(&self) -> bool;
}

/// One page of results with lazily computed navigation.
///
/// Derived values are computed from the base fields on every read unless a setter
/// has pinned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResults<T> {
    items: Vec<T>,
    total_count: u64,
    skips: u64,
    page_no: u64,
    count_per_page: u64,
    page_per_section: u64,

    total_page: Option<u64>,
    start_page_no: Option<u64>,
    end_page_no: Option<u64>,
    page_nos: Option<Vec<u64>>,
    has_previous_page: Option<bool>,
    has_next_page: Option<bool>,
    has_previous_page_section: Option<bool>,
    has_next_page_section: Option<bool>,

    /// Resource named in the `Content-Range` response header
    resource_name: String,
}

impl<T> Default for QueryResults<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            skips: 0,
            page_no: 1,
            count_per_page: 20,
            page_per_section: 5,
            total_page: None,
            start_page_no: None,
            end_page_no: None,
            page_nos: None,
            has_previous_page: None,
            has_next_page: None,
            has_previous_page_section: None,
            has_next_page_section: None,
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
        }
    }
}

impl<T> QueryResults<T> {
    #[must_use]
    pub fn new(
        items: Vec<T>,
        total_count: u64,
        skips: u64,
        count_per_page: u64,
        page_per_section: u64,
    ) -> Self {
        let page_no = if count_per_page == 0 {
            1
        } else {
            skips / count_per_page + 1
        };

        Self {
            items,
            total_count,
            skips,
            page_no,
            count_per_page,
            page_per_section,
            ..Self::default()
        }
    }

    /// Results with no paging context, collapsed to a single page
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        let mut results = Self {
            items,
            ..Self::default()
        };
        results.reset_with_items();
        results
    }

    /// One page holding every item: count and page size equal the item count
    pub fn reset_with_items(&mut self) {
        let count = self.items.len() as u64;
        self.total_count = count;
        self.skips = 0;
        self.page_no = 1;
        self.count_per_page = count;
        self.page_per_section = 1;
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Convert every item, keeping paging state
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> QueryResults<U> {
        QueryResults {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            skips: self.skips,
            page_no: self.page_no,
            count_per_page: self.count_per_page,
            page_per_section: self.page_per_section,
            total_page: self.total_page,
            start_page_no: self.start_page_no,
            end_page_no: self.end_page_no,
            page_nos: self.page_nos,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            has_previous_page_section: self.has_previous_page_section,
            has_next_page_section: self.has_next_page_section,
            resource_name: self.resource_name,
        }
    }

    /// Name the resource in the `Content-Range` header sent by `into_response`
    #[must_use]
    pub fn with_resource_name(mut self, resource_name: impl Into<String>) -> Self {
        self.resource_name = resource_name.into();
        self
    }

    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    // ============================================================================
    // Base setters
    // ============================================================================

    pub fn set_total_count(&mut self, total_count: u64) {
        self.total_count = total_count;
    }

    pub fn set_skips(&mut self, skips: u64) {
        self.skips = skips;
    }

    pub fn set_page_no(&mut self, page_no: u64) {
        self.page_no = page_no;
    }

    pub fn set_count_per_page(&mut self, count_per_page: u64) {
        self.count_per_page = count_per_page;
    }

    pub fn set_page_per_section(&mut self, page_per_section: u64) {
        self.page_per_section = page_per_section;
    }

    // ============================================================================
    // Overrides for derived values
    // ============================================================================

    pub fn set_total_page(&mut self, total_page: u64) {
        self.total_page = Some(total_page);
    }

    pub fn set_start_page_no(&mut self, start_page_no: u64) {
        self.start_page_no = Some(start_page_no);
    }

    pub fn set_end_page_no(&mut self, end_page_no: u64) {
        self.end_page_no = Some(end_page_no);
    }

    pub fn set_page_nos(&mut self, page_nos: Vec<u64>) {
        self.page_nos = Some(page_nos);
    }

    pub fn set_has_previous_page(&mut self, value: bool) {
        self.has_previous_page = Some(value);
    }

    pub fn set_has_next_page(&mut self, value: bool) {
        self.has_next_page = Some(value);
    }

    pub fn set_has_previous_page_section(&mut self, value: bool) {
        self.has_previous_page_section = Some(value);
    }

    pub fn set_has_next_page_section(&mut self, value: bool) {
        self.has_next_page_section = Some(value);
    }

    /// Content-Range header for this page
    #[must_use]
    pub fn content_range(&self, resource_name: &str) -> HeaderMap {
        calculate_content_range(self.skips, self.count_per_page, self.total_count, resource_name)
    }
}

impl<T> Paging for QueryResults<T> {
    fn total_count(&self) -> u64 {
        self.total_count
    }

    fn skips(&self) -> u64 {
        self.skips
    }

    fn page_no(&self) -> u64 {
        self.page_no
    }

    fn count_per_page(&self) -> u64 {
        self.count_per_page
    }

    fn page_per_section(&self) -> u64 {
        self.page_per_section
    }

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn total_page(&self) -> u64 {
        self.total_page.unwrap_or_else(|| {
            if self.total_count == 0 || self.count_per_page == 0 {
                1
            } else {
                self.total_count.div_ceil(self.count_per_page)
            }
        })
    }

    fn start_page_no(&self) -> u64 {
        self.start_page_no.unwrap_or_else(|| {
            if self.total_count == 0 || self.page_per_section == 0 {
                return 1;
            }
            let current_section = self.page_no.div_ceil(self.page_per_section);
            current_section.saturating_sub(1) * self.page_per_section + 1
        })
    }

    fn end_page_no(&self) -> u64 {
        self.end_page_no.unwrap_or_else(|| {
            if self.total_count == 0 || self.count_per_page == 0 {
                return 1;
            }
            let last_page = self.total_count.div_ceil(self.count_per_page);
            let section_end = (self.start_page_no() + self.page_per_section).saturating_sub(1);
            last_page.min(section_end)
        })
    }

    fn page_nos(&self) -> Vec<u64> {
        match &self.page_nos {
            Some(page_nos) => page_nos.clone(),
            None => (self.start_page_no()..=self.end_page_no()).collect(),
        }
    }

    fn has_previous_page(&self) -> bool {
        self.has_previous_page
            .unwrap_or_else(|| self.total_page() > 1 && self.page_no > 1)
    }

    fn has_next_page(&self) -> bool {
        self.has_next_page
            .unwrap_or_else(|| self.page_no < self.total_page())
    }

    fn has_previous_page_section(&self) -> bool {
        self.has_previous_page_section
            .unwrap_or_else(|| self.total_page() > 1 && self.page_no > self.page_per_section)
    }

    fn has_next_page_section(&self) -> bool {
        self.has_next_page_section.unwrap_or_else(|| {
            if self.total_count == 0 || self.page_per_section == 0 {
                return false;
            }
            let section_count = self.total_page().div_ceil(self.page_per_section);
            let current_section = self.page_no.div_ceil(self.page_per_section);
            section_count != current_section
        })
    }
}

impl<T: Serialize> Serialize for QueryResults<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryResults", 14)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("total_count", &self.total_count)?;
        state.serialize_field("skips", &self.skips)?;
        state.serialize_field("page_no", &self.page_no)?;
        state.serialize_field("count_per_page", &self.count_per_page)?;
        state.serialize_field("page_per_section", &self.page_per_section)?;
        state.serialize_field("total_page", &self.total_page())?;
        state.serialize_field("start_page_no", &self.start_page_no())?;
        state.serialize_field("end_page_no", &self.end_page_no())?;
        state.serialize_field("page_nos", &self.page_nos())?;
        state.serialize_field("has_previous_page", &self.has_previous_page())?;
        state.serialize_field("has_next_page", &self.has_next_page())?;
        state.serialize_field("has_previous_page_section", &self.has_previous_page_section())?;
        state.serialize_field("has_next_page_section", &self.has_next_page_section())?;
        state.end()
    }
}

impl<T: Serialize> IntoResponse for QueryResults<T> {
    fn into_response(self) -> Response {
        let headers = self.content_range(&self.resource_name);
        (headers, Json(self)).into_response()
    }
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect()
}

/// Build a `Content-Range` header such as `items 20-39/45`.
///
/// The upper bound is clipped to `total_count`, so unbounded pages and empty
/// result sets stay well formed.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    limit: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let max_offset_limit = offset
        .saturating_add(limit)
        .saturating_sub(1)
        .min(total_count);

    let safe_name = sanitize_resource_name(resource_name);
    let content_range = format!("{safe_name} {offset}-{max_offset_limit}/{total_count}");

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    } else if let Ok(value) = format!("items {offset}-{max_offset_limit}/{total_count}").parse() {
        headers.insert("Content-Range", value);
    }

    headers
}
