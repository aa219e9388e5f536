use chrono::{NaiveDate, NaiveDateTime};
use querycrate::{EnumDescriptor, FieldDescriptor, FieldSearchType, FieldType, SchemaDescriptor};
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;

pub mod member_entity;
pub mod team_entity;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    seed(&db).await?;

    Ok(db)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    team_entity::Entity::insert_many([
        team_entity::ActiveModel {
            id: Set(1),
            title: Set("Platform".to_string()),
        },
        team_entity::ActiveModel {
            id: Set(2),
            title: Set("Payments".to_string()),
        },
    ])
    .exec(db)
    .await?;

    let members = [
        (1, "John Smith", "ACTIVE", "010-1234-5678", true, 80, 1, at(2024, 1, 1, 9, 0)),
        (2, "Jane Doe", "INACTIVE", "010-2222-3333", false, 65, 2, at(2024, 1, 2, 10, 0)),
        (3, "Johnny Park", "PENDING", "010-9999-0000", true, 92, 1, at(2024, 1, 3, 11, 0)),
        (4, "Alice Kim", "ACTIVE", "011-444-5555", true, 71, 2, at(2024, 2, 10, 12, 0)),
        (5, "Bob Lee", "INACTIVE", "016-777-8888", false, 55, 1, at(2024, 3, 5, 13, 30)),
    ];

    member_entity::Entity::insert_many(members.into_iter().map(
        |(id, name, status, phone, active, score, team_id, joined_at)| member_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            status: Set(status.to_string()),
            phone: Set(phone.to_string()),
            active: Set(active),
            score: Set(score),
            team_id: Set(team_id),
            joined_at: Set(joined_at),
        },
    ))
    .exec(db)
    .await?;

    Ok(())
}

/// Response type declaring how each member field is searched
pub fn member_response() -> SchemaDescriptor {
    SchemaDescriptor::new("MemberResponse")
        .field(FieldDescriptor::new("id", FieldType::Integer))
        .field(FieldDescriptor::new("name", FieldType::String))
        .field(
            FieldDescriptor::new(
                "status",
                FieldType::Enum(EnumDescriptor::new(
                    "MemberStatus",
                    ["ACTIVE", "INACTIVE", "PENDING"],
                )),
            )
            .with_filter(FieldSearchType::Enum),
        )
        .field(FieldDescriptor::new("phone", FieldType::String).with_filter(FieldSearchType::PhoneNo))
        .field(FieldDescriptor::new("active", FieldType::Boolean).with_filter(FieldSearchType::Boolean))
        .field(FieldDescriptor::new("score", FieldType::Integer).with_filter(FieldSearchType::Number))
        .field(FieldDescriptor::new("joined_at", FieldType::DateTime).with_date_filter(true))
}

pub fn ids(members: &[member_entity::Model]) -> Vec<i32> {
    members.iter().map(|m| m.id).collect()
}

pub fn strings(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(ToString::to_string).collect())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTeamTable), Box::new(CreateMemberTable)]
    }
}

pub struct CreateTeamTable;

#[async_trait::async_trait]
impl MigrationName for CreateTeamTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_team_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTeamTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Team::Table)
            .if_not_exists()
            .col(ColumnDef::new(Team::Id).integer().not_null().primary_key())
            .col(ColumnDef::new(Team::Title).string().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;
        Ok(())
    }
}

pub struct CreateMemberTable;

#[async_trait::async_trait]
impl MigrationName for CreateMemberTable {
    fn name(&self) -> &'static str {
        "m20240101_000002_create_member_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateMemberTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Member::Table)
            .if_not_exists()
            .col(ColumnDef::new(Member::Id).integer().not_null().primary_key())
            .col(ColumnDef::new(Member::Name).string().not_null())
            .col(ColumnDef::new(Member::Status).string().not_null())
            .col(ColumnDef::new(Member::Phone).string().not_null())
            .col(
                ColumnDef::new(Member::Active)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(Member::Score)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(Member::TeamId).integer().not_null())
            .col(ColumnDef::new(Member::JoinedAt).date_time().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Member::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Team {
    Table,
    Id,
    Title,
}

#[derive(DeriveIden)]
enum Member {
    Table,
    Id,
    Name,
    Status,
    Phone,
    Active,
    Score,
    TeamId,
    JoinedAt,
}
