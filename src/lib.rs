pub mod errors;
pub mod filtering;
pub mod models;
pub mod pagination;
pub mod provider;
pub mod source;

pub use errors::QueryError;
pub use filtering::{
    ColumnAlias, ColumnMapping, EnumDescriptor, FieldDescriptor, FieldSearchType, FieldType,
    JoinedRelation, KeywordSearchItem, PeriodSearchItem, SchemaDescriptor, SearchFilter,
    SortDirection, SortItem,
};
pub use models::{ProviderConfig, RequestResources, SearchParameters};
pub use pagination::{DEFAULT_PAGE_PER_SECTION, DEFAULT_RESOURCE_NAME, Paging, QueryResults, UNBOUNDED};
pub use provider::{QueryContext, QueryProvider, QueryResultsCallback, TracingCallback};
pub use serde_with;
pub use source::{EntityQuery, QuerySource};
