//! Closed vocabularies of a listing. Stored as their member names.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum CarType {
    #[sea_orm(string_value = "Economy")]
    Economy,
    #[sea_orm(string_value = "Compact")]
    Compact,
    #[sea_orm(string_value = "Sedan")]
    Sedan,
    #[sea_orm(string_value = "Suv")]
    Suv,
    #[sea_orm(string_value = "Luxury")]
    Luxury,
    #[sea_orm(string_value = "Van")]
    Van,
    #[sea_orm(string_value = "Convertible")]
    Convertible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Brand {
    #[sea_orm(string_value = "Renault")]
    Renault,
    #[sea_orm(string_value = "Dacia")]
    Dacia,
    #[sea_orm(string_value = "Peugeot")]
    Peugeot,
    #[sea_orm(string_value = "Citroen")]
    Citroen,
    #[sea_orm(string_value = "Volkswagen")]
    Volkswagen,
    #[sea_orm(string_value = "Toyota")]
    Toyota,
    #[sea_orm(string_value = "Hyundai")]
    Hyundai,
    #[sea_orm(string_value = "Kia")]
    Kia,
    #[sea_orm(string_value = "Fiat")]
    Fiat,
    #[sea_orm(string_value = "Ford")]
    Ford,
    #[sea_orm(string_value = "Skoda")]
    Skoda,
    #[sea_orm(string_value = "Seat")]
    Seat,
    #[sea_orm(string_value = "Opel")]
    Opel,
    #[sea_orm(string_value = "Nissan")]
    Nissan,
    #[sea_orm(string_value = "Audi")]
    Audi,
    #[sea_orm(string_value = "Mercedes")]
    Mercedes,
    #[sea_orm(string_value = "Bmw")]
    Bmw,
}

/// Price bracket ("gamme") a listing is advertised under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PriceRange {
    #[sea_orm(string_value = "Budget")]
    Budget,
    #[sea_orm(string_value = "Comfort")]
    Comfort,
    #[sea_orm(string_value = "Premium")]
    Premium,
    #[sea_orm(string_value = "Luxury")]
    Luxury,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Transmission {
    #[sea_orm(string_value = "Manual")]
    Manual,
    #[sea_orm(string_value = "Automatic")]
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum FuelType {
    #[sea_orm(string_value = "Petrol")]
    Petrol,
    #[sea_orm(string_value = "Diesel")]
    Diesel,
    #[sea_orm(string_value = "Hybrid")]
    Hybrid,
    #[sea_orm(string_value = "Electric")]
    Electric,
}

/// Exact, case-sensitive lookup of a member by its stored name.
pub fn parse_member<E>(raw: &str) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    E::try_from_value(&raw.to_string()).ok()
}

/// Stored names of every member, in declaration order.
pub fn member_names<E>() -> Vec<String>
where
    E: ActiveEnum<Value = String>,
{
    E::values()
}
