//! # Query Provider
//!
//! [`QueryProvider`] is long-lived and shared. Each request gets its own
//! [`QueryContext`] from [`QueryProvider::set_request_resources`], which holds the
//! normalized parameters plus any explicit conditions and base sorts for that request
//! only.
//!
//! ```rust,ignore
//! let provider = QueryProvider::default();
//!
//! async fn list_members(
//!     State(state): State<AppState>,
//!     Query(params): Query<RequestResources>,
//! ) -> QueryResults<member::Model> {
//!     let mut context = state.provider.set_request_resources(params);
//!     context.set_base_sort("id", "desc");
//!     context.add_other_conditions([Condition::all().add(member::Column::Active.eq(true))]);
//!
//!     context
//!         .create_query_results(
//!             &state.db,
//!             EntityQuery::<member::Entity>::find(),
//!             Some(&state.member_response),
//!             Some(Expr::col((member::Entity, member::Column::Id)).count()),
//!         )
//!         .await
//! }
//! ```
//!
//! ## Failure handling
//!
//! [`QueryContext::try_create_query_results`] returns every enum or database failure.
//! [`QueryContext::create_query_results`] logs it and returns an empty
//! [`QueryResults`] so a broken search never takes a listing page down.

use sea_orm::{Condition, DatabaseConnection, sea_query::SimpleExpr};
use std::sync::Arc;

use crate::errors::QueryError;
use crate::filtering::{
    ColumnMapping, FieldResolver, JoinedRelation, SchemaDescriptor, SortItem, build_keyword_group,
    build_period_group, build_sort_items, collect_keyword_items, collect_period_items,
    combine_conditions, get_sort_orders,
    sort::{apply_order_by, order_by_with_direction, resolve_sort_statements},
};
use crate::models::{ProviderConfig, RequestResources, SearchParameters};
use crate::pagination::{Paging, QueryResults, UNBOUNDED};
use crate::source::QuerySource;

/// Notified after every paged result is built.
pub trait QueryResultsCallback: Send + Sync {
    fn after_created_query_results(
        &self,
        params: &SearchParameters,
        results: &dyn Paging,
        response_type: Option<&str>,
    );
}

/// Default callback, logging a summary at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCallback;

impl QueryResultsCallback for TracingCallback {
    fn after_created_query_results(
        &self,
        params: &SearchParameters,
        results: &dyn Paging,
        response_type: Option<&str>,
    ) {
        tracing::debug!(
            query = %params.name,
            response_type = response_type.unwrap_or_default(),
            total_count = results.total_count(),
            page_no = results.page_no(),
            items = results.item_count(),
            "Created query results"
        );
    }
}

/// Shared entry point holding configuration and the results callback.
#[derive(Clone)]
pub struct QueryProvider {
    config: ProviderConfig,
    callback: Arc<dyn QueryResultsCallback>,
}

impl Default for QueryProvider {
    fn default() -> Self {
        Self::new(Arc::new(TracingCallback))
    }
}

impl QueryProvider {
    #[must_use]
    pub fn new(callback: Arc<dyn QueryResultsCallback>) -> Self {
        Self {
            config: ProviderConfig::default(),
            callback,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Start a fresh context for one request
    #[must_use]
    pub fn set_request_resources(&self, resources: RequestResources) -> QueryContext<'_> {
        QueryContext {
            provider: self,
            params: SearchParameters::normalize(resources, &self.config),
            predicates: Vec::new(),
            sorts: Vec::new(),
            default_table: None,
        }
    }
}

/// Per-request query building state.
pub struct QueryContext<'p> {
    provider: &'p QueryProvider,
    params: SearchParameters,
    predicates: Vec<Condition>,
    sorts: Vec<SortItem>,
    default_table: Option<String>,
}

impl QueryContext<'_> {
    /// Replace the parameters and clear conditions, base sorts and the default table
    pub fn set_request_resources(&mut self, resources: RequestResources) {
        self.params = SearchParameters::normalize(resources, &self.provider.config);
        self.predicates.clear();
        self.sorts.clear();
        self.default_table = None;
    }

    #[must_use]
    pub const fn params(&self) -> &SearchParameters {
        &self.params
    }

    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.params.has_key(key)
    }

    #[must_use]
    pub fn get_values(&self, key: &str) -> &[String] {
        self.params.get_values(key)
    }

    #[must_use]
    pub fn get_first_value(&self, key: &str) -> &str {
        self.params.get_first_value(key)
    }

    /// Sort by `column` unless the request asked for its own ordering
    pub fn set_base_sort(&mut self, column: &str, direction: &str) {
        if self.params.order_fields.is_empty() {
            self.sorts.push(SortItem::new(column, direction));
        }
    }

    /// Sorts applied ahead of the request's own ordering
    pub fn set_base_sorts(&mut self, items: impl IntoIterator<Item = SortItem>) {
        self.sorts.extend(items);
    }

    /// Replace the explicit conditions AND'd into every query
    pub fn add_other_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        self.predicates.clear();
        self.predicates.extend(conditions);
    }

    /// Table used for fields no other strategy resolves
    pub fn set_default_table(&mut self, table: impl Into<String>) {
        self.default_table = Some(table.into());
    }

    /// Sort items for an explicit mapping, see [`get_sort_orders`]
    #[must_use]
    pub fn get_sort_orders(
        &self,
        class: Option<&str>,
        default_table: &str,
        mappings: &[(&str, ColumnMapping)],
        order_fields: &[String],
        order_directions: &[String],
        default_items: &[SortItem],
    ) -> Vec<SortItem> {
        get_sort_orders(
            class,
            default_table,
            mappings,
            order_fields,
            order_directions,
            default_items,
        )
    }

    /// Apply sort items verbatim
    #[must_use]
    pub fn order_by_with_direction<Q: QuerySource>(&self, source: Q, orders: &[SortItem]) -> Q {
        order_by_with_direction(source, orders)
    }

    // ============================================================================
    // Augmentation
    // ============================================================================

    fn resolver<'a>(
        &'a self,
        projection: &'a [String],
        joins: &'a [JoinedRelation],
    ) -> FieldResolver<'a> {
        FieldResolver::new(projection, joins).with_default_table(self.default_table.as_deref())
    }

    /// Base sorts followed by the request's, kept to projected fields when asked
    fn sort_items(&self, resolver: &FieldResolver<'_>) -> Vec<SortItem> {
        let mut sorts = self.sorts.clone();
        let requested = build_sort_items(&self.params.order_fields, &self.params.order_directions);
        if self.params.only_projections {
            sorts.extend(
                requested
                    .into_iter()
                    .filter(|item| resolver.projection_contains(&item.path())),
            );
        } else {
            sorts.extend(requested);
        }
        sorts
    }

    /// Search field and value pairs, kept to projected fields when asked
    fn search_pairs(&self, resolver: &FieldResolver<'_>) -> (Vec<String>, Vec<String>) {
        if !self.params.only_projections
            || self.params.search_fields.len() != self.params.search_values.len()
        {
            return (
                self.params.search_fields.clone(),
                self.params.search_values.clone(),
            );
        }

        self.params
            .search_fields
            .iter()
            .zip(&self.params.search_values)
            .filter(|(field, _)| resolver.projection_contains(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .unzip()
    }

    /// Order `query` by the base and requested sorts resolvable against `query`
    #[must_use]
    pub fn apply_order_by_queries<Q: QuerySource>(&self, query: Q) -> Q {
        let projection = query.projection();
        let joins = query.joins().to_vec();
        let resolver = self.resolver(&projection, &joins);
        let statements = resolve_sort_statements(&resolver, &self.sort_items(&resolver));
        apply_order_by(query, &statements)
    }

    /// Filter `query` by the explicit conditions and the request's keyword and period searches
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidEnumValue`] or [`QueryError::UndeclaredEnum`] for
    /// enum searches that do not validate.
    pub fn apply_where_queries<Q: QuerySource>(
        &self,
        query: Q,
        response: Option<&SchemaDescriptor>,
    ) -> Result<Q, QueryError> {
        let projection = query.projection();
        let joins = query.joins().to_vec();
        let resolver = self.resolver(&projection, &joins);

        let (search_fields, search_values) = self.search_pairs(&resolver);
        let keyword_items = collect_keyword_items(
            &search_fields,
            &search_values,
            self.provider.config.keyword_separator,
            response,
            &resolver,
        );
        let period_items = collect_period_items(
            &self.params.search_period_fields,
            &self.params.search_start_dates,
            &self.params.search_end_dates,
            response,
            &resolver,
        );

        let condition = combine_conditions(
            &self.predicates,
            build_keyword_group(&keyword_items)?,
            build_period_group(&period_items),
        );

        Ok(query.filter(condition))
    }

    // ============================================================================
    // Paged mode
    // ============================================================================

    /// Search, sort and page `source`, returning any failure.
    ///
    /// Without `total_count` the total is the size of the fetched page, which
    /// under-reports anything past the first page. With it, the expression runs
    /// against `source` as given, before searches and paging are applied.
    ///
    /// # Errors
    ///
    /// Enum validation failures and database errors.
    pub async fn try_create_query_results<Q: QuerySource>(
        &self,
        db: &DatabaseConnection,
        source: Q,
        response: Option<&SchemaDescriptor>,
        total_count: Option<SimpleExpr>,
    ) -> Result<QueryResults<Q::Item>, QueryError> {
        let mut query = self.apply_order_by_queries(source.clone());
        query = self.apply_where_queries(query, response)?;

        let skip = self.params.skip;
        let count_per_page = self.params.count_per_page;
        if skip > 0 {
            query = query.offset(skip);
        }
        if count_per_page < UNBOUNDED {
            query = query.limit(count_per_page);
        }

        let items = query.fetch(db).await?;
        let total_count = match total_count {
            Some(expression) => source.fetch_count(db, expression).await?,
            None => {
                tracing::debug!(query = %self.params.name, "No count expression, total is the page size");
                items.len() as u64
            }
        };

        let results = QueryResults::new(
            items,
            total_count,
            skip,
            count_per_page,
            self.provider.config.page_per_section,
        );

        self.provider.callback.after_created_query_results(
            &self.params,
            &results,
            response.map(|r| r.type_name.as_str()),
        );

        Ok(results)
    }

    /// [`try_create_query_results`](Self::try_create_query_results), logging any
    /// failure and returning empty results in its place
    pub async fn create_query_results<Q: QuerySource>(
        &self,
        db: &DatabaseConnection,
        source: Q,
        response: Option<&SchemaDescriptor>,
        total_count: Option<SimpleExpr>,
    ) -> QueryResults<Q::Item> {
        match self
            .try_create_query_results(db, source, response, total_count)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                tracing::error!(query = %self.params.name, error = %err, "Failed to create query results");
                QueryResults::default()
            }
        }
    }

    // ============================================================================
    // Full-fetch mode
    // ============================================================================

    /// Every row of `source` ordered by `orders`, as one unbounded page
    pub async fn create_full_query_results<Q: QuerySource>(
        &self,
        db: &DatabaseConnection,
        source: Q,
        orders: &[SortItem],
    ) -> QueryResults<Q::Item> {
        match order_by_with_direction(source, orders).fetch(db).await {
            Ok(items) => {
                let total_count = items.len() as u64;
                QueryResults::new(
                    items,
                    total_count,
                    0,
                    UNBOUNDED,
                    self.provider.config.page_per_section,
                )
            }
            Err(err) => {
                tracing::error!(query = %self.params.name, error = %err, "Failed to fetch full query results");
                QueryResults::default()
            }
        }
    }

    /// [`create_full_query_results`](Self::create_full_query_results) converting each row into `D`
    pub async fn create_full_query_results_into<Q, D>(
        &self,
        db: &DatabaseConnection,
        source: Q,
        orders: &[SortItem],
    ) -> QueryResults<D>
    where
        Q: QuerySource,
        D: From<Q::Item>,
    {
        self.create_full_query_results(db, source, orders)
            .await
            .map(D::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{FieldDescriptor, FieldType, SortDirection};
    use sea_orm::sea_query::{Alias, Expr, Query, QueryStatementWriter, SqliteQueryBuilder};
    use std::sync::Mutex;

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(ToString::to_string).collect())
    }

    /// In-memory source recording what was applied to it
    #[derive(Clone, Default)]
    struct RecordingSource {
        projection: Vec<String>,
        joins: Vec<JoinedRelation>,
        filters: Vec<Condition>,
        orders: Vec<String>,
        offset: Option<u64>,
        limit: Option<u64>,
        rows: Vec<u32>,
    }

    #[async_trait::async_trait]
    impl QuerySource for RecordingSource {
        type Item = u32;

        fn projection(&self) -> Vec<String> {
            self.projection.clone()
        }

        fn joins(&self) -> &[JoinedRelation] {
            &self.joins
        }

        fn filter(mut self, condition: Condition) -> Self {
            self.filters.push(condition);
            self
        }

        fn order_by(mut self, expr: SimpleExpr, order: sea_orm::sea_query::Order) -> Self {
            let column = Query::select().expr(expr).to_string(SqliteQueryBuilder);
            self.orders.push(format!("{column} {order:?}"));
            self
        }

        fn offset(mut self, offset: u64) -> Self {
            self.offset = Some(offset);
            self
        }

        fn limit(mut self, limit: u64) -> Self {
            self.limit = Some(limit);
            self
        }

        async fn fetch(self, _db: &DatabaseConnection) -> Result<Vec<u32>, sea_orm::DbErr> {
            Ok(self.rows)
        }

        async fn fetch_count(
            &self,
            _db: &DatabaseConnection,
            _expression: SimpleExpr,
        ) -> Result<u64, sea_orm::DbErr> {
            Ok(self.rows.len() as u64)
        }
    }

    fn source() -> RecordingSource {
        RecordingSource {
            projection: vec!["member.id".into(), "member.name".into(), "member.score".into()],
            joins: vec![JoinedRelation::new(
                "team",
                SchemaDescriptor::new("Team").field(FieldDescriptor::new("title", FieldType::String)),
            )],
            ..RecordingSource::default()
        }
    }

    // ========================================================================
    // Parameter intake
    // ========================================================================

    #[test]
    fn test_lookup_accessors() {
        let provider = QueryProvider::default();
        let context = provider.set_request_resources(RequestResources {
            search_fields: strings(&["Status"]),
            search_values: strings(&["ACTIVE;PENDING"]),
            ..RequestResources::default()
        });
        assert!(context.has_key("status"));
        assert_eq!(context.get_values("STATUS"), ["ACTIVE", "PENDING"]);
        assert_eq!(context.get_first_value("status"), "ACTIVE");
        assert_eq!(context.get_first_value("name"), "");
    }

    #[test]
    fn test_set_request_resources_resets_state() {
        let provider = QueryProvider::default();
        let mut context = provider.set_request_resources(RequestResources::default());
        context.set_base_sort("id", "desc");
        context.add_other_conditions([Condition::all()]);
        context.set_default_table("member");

        context.set_request_resources(RequestResources {
            name: Some("second".into()),
            ..RequestResources::default()
        });
        assert_eq!(context.params().name, "second");
        assert!(context.sorts.is_empty());
        assert!(context.predicates.is_empty());
        assert!(context.default_table.is_none());
    }

    #[test]
    fn test_base_sort_yields_to_requested_order() {
        let provider = QueryProvider::default();
        let mut context = provider.set_request_resources(RequestResources {
            order_fields: strings(&["name"]),
            ..RequestResources::default()
        });
        context.set_base_sort("id", "desc");
        assert!(context.sorts.is_empty());

        let mut context = provider.set_request_resources(RequestResources::default());
        context.set_base_sort("id", "desc");
        assert_eq!(context.sorts, vec![SortItem::new("id", "desc")]);
    }

    #[test]
    fn test_add_other_conditions_replaces_previous() {
        let provider = QueryProvider::default();
        let mut context = provider.set_request_resources(RequestResources::default());
        context.add_other_conditions([Condition::all(), Condition::any()]);
        context.add_other_conditions([Condition::all()]);
        assert_eq!(context.predicates.len(), 1);
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    #[test]
    fn test_order_by_queries_are_idempotent() {
        let provider = QueryProvider::default();
        let mut context = provider.set_request_resources(RequestResources {
            order_fields: strings(&["score", "title", "ghost"]),
            order_directions: strings(&["desc"]),
            ..RequestResources::default()
        });
        context.set_base_sorts([SortItem::new("member.id", "asc")]);

        let first = context.apply_order_by_queries(source());
        let second = context.apply_order_by_queries(source());
        assert_eq!(first.orders.len(), 3);
        assert_eq!(first.orders, second.orders);
        assert_eq!(first.orders[0], r#"SELECT "member"."id" Asc"#);
        assert_eq!(first.orders[1], r#"SELECT "member"."score" Desc"#);
        assert_eq!(first.orders[2], r#"SELECT "team"."title" Asc"#);
    }

    #[test]
    fn test_only_projections_drops_unprojected_sorts() {
        let provider = QueryProvider::default();
        let context = provider.set_request_resources(RequestResources {
            only_projections: Some(true),
            order_fields: strings(&["title", "name"]),
            ..RequestResources::default()
        });
        let ordered = context.apply_order_by_queries(source());
        assert_eq!(ordered.orders.len(), 1);
        assert_eq!(ordered.orders[0], r#"SELECT "member"."name" Asc"#);
    }

    #[test]
    fn test_get_sort_orders_delegates() {
        let provider = QueryProvider::default();
        let context = provider.set_request_resources(RequestResources::default());
        let items = context.get_sort_orders(
            None,
            "member",
            &[],
            &["name".to_string()],
            &["desc".to_string()],
            &[],
        );
        assert_eq!(items, vec![SortItem::with_table("member", "name", "desc")]);
        assert_eq!(items[0].direction, SortDirection::Desc);
    }

    // ========================================================================
    // Paged and full-fetch modes
    // ========================================================================

    struct CountingCallback(Mutex<Vec<(String, u64, Option<String>)>>);

    impl QueryResultsCallback for CountingCallback {
        fn after_created_query_results(
            &self,
            params: &SearchParameters,
            results: &dyn Paging,
            response_type: Option<&str>,
        ) {
            self.0.lock().unwrap().push((
                params.name.clone(),
                results.total_count(),
                response_type.map(str::to_string),
            ));
        }
    }

    fn disconnected() -> DatabaseConnection {
        DatabaseConnection::Disconnected
    }

    #[tokio::test]
    async fn test_paged_mode_applies_offset_and_limit() {
        let callback = Arc::new(CountingCallback(Mutex::new(Vec::new())));
        let provider = QueryProvider::new(callback.clone());
        let context = provider.set_request_resources(RequestResources {
            name: Some("members".into()),
            skip: Some(40),
            count_per_page: Some(20),
            ..RequestResources::default()
        });

        let response = SchemaDescriptor::new("MemberResponse");
        let results = context
            .try_create_query_results(
                &disconnected(),
                RecordingSource {
                    rows: vec![1, 2, 3],
                    ..source()
                },
                Some(&response),
                Some(Expr::col(Alias::new("id")).count()),
            )
            .await
            .unwrap();

        assert_eq!(results.items(), &[1, 2, 3]);
        assert_eq!(results.page_no(), 3);
        assert_eq!(results.page_per_section(), 20);
        assert_eq!(
            callback.0.lock().unwrap().as_slice(),
            &[("members".to_string(), 3, Some("MemberResponse".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_enum_failure_is_returned_or_swallowed() {
        use crate::filtering::{EnumDescriptor, FieldSearchType};

        let provider = QueryProvider::default();
        let context = provider.set_request_resources(RequestResources {
            search_fields: strings(&["status"]),
            search_values: strings(&["ARCHIVED"]),
            ..RequestResources::default()
        });
        let response = SchemaDescriptor::new("MemberResponse").field(
            FieldDescriptor::new(
                "status",
                FieldType::Enum(EnumDescriptor::new("MemberStatus", ["ACTIVE"])),
            )
            .with_filter(FieldSearchType::Enum),
        );
        let rows = RecordingSource {
            rows: vec![1],
            ..source()
        };

        let err = context
            .try_create_query_results(&disconnected(), rows.clone(), Some(&response), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidEnumValue { .. }));

        let results = context
            .create_query_results(&disconnected(), rows, Some(&response), None)
            .await;
        assert!(results.items().is_empty());
        assert_eq!(results.total_count(), 0);
        assert_eq!(results.total_page(), 1);
    }

    #[tokio::test]
    async fn test_full_fetch_is_one_unbounded_page() {
        let provider = QueryProvider::default();
        let context = provider.set_request_resources(RequestResources::default());
        let results = context
            .create_full_query_results_into::<_, u64>(
                &disconnected(),
                RecordingSource {
                    rows: vec![5, 6],
                    ..source()
                },
                &[SortItem::new("member.name", "asc")],
            )
            .await;
        assert_eq!(results.items(), &[5_u64, 6]);
        assert_eq!(results.total_count(), 2);
        assert_eq!(results.count_per_page(), UNBOUNDED);
        assert_eq!(results.total_page(), 1);
    }
}
