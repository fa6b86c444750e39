use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use querycrate::{Controller, Meta, routes};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

pub mod parent_entity;

use parent_entity::{ActiveModel, Column, Entity, Parents};

pub const FIRST_NAMES: [&str; 10] = [
    "alpha-one",
    "bravo-two",
    "charlie-three",
    "delta-four",
    "echo-five",
    "foxtrot-six",
    "alpha-seven",
    "hotel-eight",
    "india-nine",
    "juliet-ten",
];

/// Route the crate's `tracing` output to the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Ten rows: `rank` 1..=10, `created_at` one second apart, `second` set on even ranks.
pub async fn seed_parents(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (i, first) in (1..).zip(FIRST_NAMES) {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            first: Set(first.to_string()),
            second: Set((i % 2 == 0).then(|| format!("second-{i}"))),
            rank: Set(i),
            created_at: Set(base_time() + Duration::seconds(i64::from(i))),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

pub fn parent_meta(db: DatabaseConnection) -> Meta<Entity> {
    Meta::<Entity>::builder()
        .connection(db)
        .filterable(["first", "second", "rank"])
        .interval_filterable(["created_at", "rank"])
        .sortable(["first", "rank", "created_at"])
        .searchable(["first", "second"])
        .max_per_page(20)
        .build()
        .unwrap()
}

pub async fn setup_controller() -> Arc<Controller<Parents>> {
    let db = setup_test_db().await.unwrap();
    seed_parents(&db).await.unwrap();
    Arc::new(Controller::new(parent_meta(db)).unwrap())
}

pub fn setup_test_app(controller: Arc<Controller<Parents>>) -> Router {
    Router::new().nest("/api/v1/parents", routes::router(controller))
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateParentTable)]
    }
}

pub struct CreateParentTable;

impl MigrationName for CreateParentTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_parent_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateParentTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Entity)
            .if_not_exists()
            .col(ColumnDef::new(Column::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Column::First)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Column::Second).string().null())
            .col(ColumnDef::new(Column::Rank).integer().not_null())
            .col(
                ColumnDef::new(Column::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            )
            .col(
                ColumnDef::new(Column::UpdatedAt)
                    .timestamp_with_time_zone()
                    .null(),
            )
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entity).to_owned())
            .await?;
        Ok(())
    }
}
