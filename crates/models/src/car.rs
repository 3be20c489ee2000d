use std::ops::RangeInclusive;

use sea_orm::{entity::prelude::*, Condition, DatabaseConnection, QueryOrder, QuerySelect, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::enums::{Brand, CarType, FuelType, PriceRange, Transmission};
use crate::errors;

pub const SEATS: RangeInclusive<i32> = 1..=20;
pub const DOORS: RangeInclusive<i32> = 2..=10;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "car")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub brand: Brand,
    pub gamme: PriceRange,
    pub price: String,
    pub seats: i32,
    pub doors: i32,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub air_conditioning: bool,
    pub quantity: i32,
    pub cover: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Normalized, enum-typed listing fields. Only the validation engine builds these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub car_type: CarType,
    pub brand: Brand,
    pub gamme: PriceRange,
    pub price: String,
    pub seats: i32,
    pub doors: i32,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub air_conditioning: bool,
    pub quantity: i32,
}

/// Equality filters for listing; `None` means "do not restrict".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarFilter {
    pub car_type: Option<CarType>,
    pub brand: Option<Brand>,
    pub gamme: Option<PriceRange>,
    pub fuel_type: Option<FuelType>,
    pub transmission: Option<Transmission>,
}

impl CarFilter {
    pub fn is_empty(&self) -> bool {
        *self == CarFilter::default()
    }

    /// Logical AND of every set field.
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(t) = self.car_type { cond = cond.add(Column::CarType.eq(t)); }
        if let Some(b) = self.brand { cond = cond.add(Column::Brand.eq(b)); }
        if let Some(g) = self.gamme { cond = cond.add(Column::Gamme.eq(g)); }
        if let Some(f) = self.fuel_type { cond = cond.add(Column::FuelType.eq(f)); }
        if let Some(t) = self.transmission { cond = cond.add(Column::Transmission.eq(t)); }
        cond
    }

    /// In-process equivalent of `condition`.
    pub fn matches(&self, car: &Model) -> bool {
        self.car_type.map_or(true, |t| car.car_type == t)
            && self.brand.map_or(true, |b| car.brand == b)
            && self.gamme.map_or(true, |g| car.gamme == g)
            && self.fuel_type.map_or(true, |f| car.fuel_type == Some(f))
            && self.transmission.map_or(true, |t| car.transmission == Some(t))
    }
}

impl ActiveModel {
    fn apply_draft(&mut self, draft: &CarDraft) {
        self.name = Set(draft.name.clone());
        self.car_type = Set(draft.car_type);
        self.brand = Set(draft.brand);
        self.gamme = Set(draft.gamme);
        self.price = Set(draft.price.clone());
        self.seats = Set(draft.seats);
        self.doors = Set(draft.doors);
        self.transmission = Set(draft.transmission);
        self.fuel_type = Set(draft.fuel_type);
        self.air_conditioning = Set(draft.air_conditioning);
        self.quantity = Set(draft.quantity);
    }
}

impl Model {
    /// Overwrite every draft-owned field; `id`, `cover` and timestamps are untouched.
    pub fn apply_draft(&mut self, draft: &CarDraft) {
        self.name = draft.name.clone();
        self.car_type = draft.car_type;
        self.brand = draft.brand;
        self.gamme = draft.gamme;
        self.price = draft.price.clone();
        self.seats = draft.seats;
        self.doors = draft.doors;
        self.transmission = draft.transmission;
        self.fuel_type = draft.fuel_type;
        self.air_conditioning = draft.air_conditioning;
        self.quantity = draft.quantity;
    }
}

/// Build the in-memory row for a new listing without touching the database.
pub fn new_model(draft: &CarDraft, cover: &str) -> Model {
    let now: DateTimeWithTimeZone = Utc::now().into();
    Model {
        id: Uuid::new_v4(),
        name: draft.name.clone(),
        car_type: draft.car_type,
        brand: draft.brand,
        gamme: draft.gamme,
        price: draft.price.clone(),
        seats: draft.seats,
        doors: draft.doors,
        transmission: draft.transmission,
        fuel_type: draft.fuel_type,
        air_conditioning: draft.air_conditioning,
        quantity: draft.quantity,
        cover: cover.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub async fn create(db: &DatabaseConnection, draft: &CarDraft, cover: &str) -> Result<Model, errors::ModelError> {
    if cover.trim().is_empty() {
        return Err(errors::ModelError::Validation("cover url required".into()));
    }
    // every column Set so the insert carries all of them
    let am = ActiveModel::from(new_model(draft, cover)).reset_all();
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn list(db: &DatabaseConnection, filter: &CarFilter, limit: Option<u64>) -> Result<Vec<Model>, errors::ModelError> {
    let mut finder = Entity::find()
        .filter(filter.condition())
        .order_by_desc(Column::CreatedAt);
    if let Some(n) = limit { finder = finder.limit(n); }
    let rows = finder.all(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(rows)
}

/// Full-field replacement; `cover` is only touched when `Some`.
/// Returns `None` when the row does not exist.
pub async fn replace(
    db: &DatabaseConnection,
    id: Uuid,
    draft: &CarDraft,
    cover: Option<&str>,
) -> Result<Option<Model>, errors::ModelError> {
    let Some(existing) = Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))? else {
        return Ok(None);
    };
    let mut am: ActiveModel = existing.into();
    am.apply_draft(draft);
    if let Some(url) = cover { am.cover = Set(url.to_string()); }
    am.updated_at = Set(Utc::now().into());
    match am.update(db).await {
        Ok(m) => Ok(Some(m)),
        // deleted between the read and the write
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(errors::ModelError::Db(e.to_string())),
    }
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<bool, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(res.rows_affected > 0)
}
