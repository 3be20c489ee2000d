//! Persistence models for the car catalog: the `car` entity, its
//! enumerations and the normalized draft produced by validation.

pub mod errors;
pub mod db;
pub mod enums;
pub mod car;

pub use enums::{Brand, CarType, FuelType, PriceRange, Transmission};
