//! # Query Sources
//!
//! A [`QuerySource`] is a not-yet-executed query that can be cloned, filtered,
//! ordered, paged and fetched, and that can describe its own projection and joins
//! so field names can be resolved against it.
//!
//! [`EntityQuery`] implements it over a sea-orm [`Select`]:
//!
//! ```rust,ignore
//! use querycrate::EntityQuery;
//! use sea_orm::{JoinType, RelationTrait};
//!
//! let query = EntityQuery::<member::Entity>::find()
//!     .join::<team::Entity>(JoinType::InnerJoin, member::Relation::Team.def());
//!
//! // projection: ["member.id", "member.name", ...]
//! // joins:      [member, team]
//! ```

use async_trait::async_trait;
use sea_orm::{
    Condition, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, IdenStatic,
    Iterable, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationDef, Select,
    sea_query::{Order, SimpleExpr},
};
use std::marker::PhantomData;

use crate::filtering::JoinedRelation;

/// An executable, chainable query that exposes its projection and joins.
#[async_trait]
pub trait QuerySource: Clone + Send + Sync {
    type Item: Send + Sync;

    /// Textual form of each selected expression
    fn projection(&self) -> Vec<String>;

    /// Joined relations, the queried entity first
    fn joins(&self) -> &[JoinedRelation];

    #[must_use]
    fn filter(self, condition: Condition) -> Self;

    #[must_use]
    fn order_by(self, expr: SimpleExpr, order: Order) -> Self;

    #[must_use]
    fn offset(self, offset: u64) -> Self;

    #[must_use]
    fn limit(self, limit: u64) -> Self;

    async fn fetch(self, db: &DatabaseConnection) -> Result<Vec<Self::Item>, DbErr>;

    /// Evaluate a count expression against this query as it stands
    async fn fetch_count(&self, db: &DatabaseConnection, expression: SimpleExpr) -> Result<u64, DbErr>;
}

/// [`QuerySource`] over a sea-orm select, fetching rows as `M`.
pub struct EntityQuery<E: EntityTrait, M = <E as EntityTrait>::Model> {
    select: Select<E>,
    projection: Vec<String>,
    joins: Vec<JoinedRelation>,
    model: PhantomData<fn() -> M>,
}

impl<E: EntityTrait> EntityQuery<E> {
    /// Wrap a select, registering the entity's columns and schema
    #[must_use]
    pub fn new(select: Select<E>) -> Self {
        let table = E::default().table_name().to_string();
        let projection = E::Column::iter()
            .map(|column| format!("{table}.{}", column.as_str()))
            .collect();

        Self {
            select,
            projection,
            joins: vec![JoinedRelation::of_entity::<E>()],
            model: PhantomData,
        }
    }

    #[must_use]
    pub fn find() -> Self {
        Self::new(E::find())
    }
}

impl<E: EntityTrait, M> EntityQuery<E, M> {
    /// Fetch rows as another model, e.g. a partial projection
    #[must_use]
    pub fn into_model<N: FromQueryResult>(self) -> EntityQuery<E, N> {
        EntityQuery {
            select: self.select,
            projection: self.projection,
            joins: self.joins,
            model: PhantomData,
        }
    }

    /// Join `R` and register its schema under its table name
    #[must_use]
    pub fn join<R: EntityTrait>(mut self, join_type: JoinType, relation: RelationDef) -> Self {
        self.select = QuerySelect::join(self.select, join_type, relation);
        self.joins.push(JoinedRelation::of_entity::<R>());
        self
    }

    /// Register a relation joined by other means
    #[must_use]
    pub fn with_joined(mut self, relation: JoinedRelation) -> Self {
        self.joins.push(relation);
        self
    }

    /// Register the text of an extra selected expression, e.g. `count(order.id) as order_count`
    #[must_use]
    pub fn project(mut self, expression: impl Into<String>) -> Self {
        self.projection.push(expression.into());
        self
    }

    /// Edit the underlying select
    #[must_use]
    pub fn map_select(mut self, f: impl FnOnce(Select<E>) -> Select<E>) -> Self {
        self.select = f(self.select);
        self
    }

    #[must_use]
    pub const fn select(&self) -> &Select<E> {
        &self.select
    }

    #[must_use]
    pub fn into_select(self) -> Select<E> {
        self.select
    }
}

impl<E: EntityTrait, M> Clone for EntityQuery<E, M> {
    fn clone(&self) -> Self {
        Self {
            select: self.select.clone(),
            projection: self.projection.clone(),
            joins: self.joins.clone(),
            model: PhantomData,
        }
    }
}

#[async_trait]
impl<E, M> QuerySource for EntityQuery<E, M>
where
    E: EntityTrait,
    M: FromQueryResult + Send + Sync,
{
    type Item = M;

    fn projection(&self) -> Vec<String> {
        self.projection.clone()
    }

    fn joins(&self) -> &[JoinedRelation] {
        &self.joins
    }

    fn filter(mut self, condition: Condition) -> Self {
        self.select = QueryFilter::filter(self.select, condition);
        self
    }

    fn order_by(mut self, expr: SimpleExpr, order: Order) -> Self {
        self.select = QueryOrder::order_by(self.select, expr, order);
        self
    }

    fn offset(mut self, offset: u64) -> Self {
        self.select = QuerySelect::offset(self.select, offset);
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.select = QuerySelect::limit(self.select, limit);
        self
    }

    async fn fetch(self, db: &DatabaseConnection) -> Result<Vec<M>, DbErr> {
        self.select.into_model::<M>().all(db).await
    }

    async fn fetch_count(&self, db: &DatabaseConnection, expression: SimpleExpr) -> Result<u64, DbErr> {
        let count = self
            .select
            .clone()
            .select_only()
            .column_as(expression, "total_count")
            .into_tuple::<i64>()
            .one(db)
            .await?
            .unwrap_or(0);

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
