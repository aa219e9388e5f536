use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub status: String,
    pub phone: String,
    pub active: bool,
    pub score: i32,
    pub team_id: i32,
    pub joined_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team_entity::Entity",
        from = "Column::TeamId",
        to = "super::team_entity::Column::Id"
    )]
    Team,
}

impl Related<super::team_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Slimmed-down listing row
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub id: i32,
    pub name: String,
}

impl From<Model> for MemberSummary {
    fn from(model: Model) -> Self {
        MemberSummary {
            id: model.id,
            name: model.name,
        }
    }
}
