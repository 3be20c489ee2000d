use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_car::Car;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Default listing order
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_car_created_at")
                    .table(Car::Table)
                    .col(Car::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Most common filter combination on the browse page
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_car_type_brand_gamme")
                    .table(Car::Table)
                    .col(Car::Type)
                    .col(Car::Brand)
                    .col(Car::Gamme)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_car_type_brand_gamme").table(Car::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_car_created_at").table(Car::Table).to_owned())
            .await
    }
}
