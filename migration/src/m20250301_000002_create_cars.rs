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
                    .col(string_len(Car::Make, 100).not_null())
                    .col(string_len(Car::CarModel, 100).not_null())
                    .col(string_len(Car::Category, 50).not_null())
                    .col(integer(Car::Year).not_null())
                    .col(integer(Car::Seats).not_null())
                    .col(integer(Car::Doors).not_null())
                    .col(string_len(Car::Transmission, 50).not_null())
                    .col(string_len(Car::FuelType, 50).not_null())
                    .col(integer(Car::Mileage).not_null())
                    .col(decimal_len(Car::RentalPricePerDay, 10, 2).not_null())
                    .col(string_len(Car::Currency, 3).not_null())
                    .col(string_len(Car::Location, 200).not_null())
                    .col(ColumnDef::new(Car::Bookings).array(ColumnType::Uuid).null())
                    .col(
                        timestamp_with_time_zone(Car::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Car::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Car {
    #[sea_orm(iden = "cars")]
    Table,
    Id,
    Make,
    CarModel,
    Category,
    Year,
    Seats,
    Doors,
    Transmission,
    FuelType,
    Mileage,
    RentalPricePerDay,
    Currency,
    Location,
    Bookings,
    CreatedAt,
}
