//! Create `car` table.
//! One row per rental listing; enum columns hold the member names as text.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Car::Table)
                    .if_not_exists()
                    .col(uuid(Car::Id).primary_key())
                    .col(string_len(Car::Name, 256).not_null())
                    .col(string_len(Car::Type, 32).not_null())
                    .col(string_len(Car::Brand, 32).not_null())
                    .col(string_len(Car::Gamme, 32).not_null())
                    .col(string_len(Car::Price, 64).not_null())
                    .col(integer(Car::Seats).not_null())
                    .col(integer(Car::Doors).not_null())
                    .col(string_len_null(Car::Transmission, 32))
                    .col(string_len_null(Car::FuelType, 32))
                    .col(boolean(Car::AirConditioning).not_null().default(false))
                    .col(integer(Car::Quantity).not_null().default(0))
                    .col(string_len(Car::Cover, 1024).not_null())
                    .col(timestamp_with_time_zone(Car::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Car::UpdatedAt).not_null())
                    .check(Expr::col(Car::Seats).between(1, 20))
                    .check(Expr::col(Car::Doors).between(2, 10))
                    .check(Expr::col(Car::Quantity).gte(0))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Car::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Car {
    Table,
    Id,
    Name,
    Type,
    Brand,
    Gamme,
    Price,
    Seats,
    Doors,
    Transmission,
    FuelType,
    AirConditioning,
    Quantity,
    Cover,
    CreatedAt,
    UpdatedAt,
}
