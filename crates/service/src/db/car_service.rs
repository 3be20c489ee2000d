use sea_orm::DatabaseConnection;
use uuid::Uuid;
use models::car::{self, CarDraft, CarFilter};
use crate::errors::ServiceError;

/// List listings matching every set filter, newest first.
pub async fn list_cars(db: &DatabaseConnection, filter: &CarFilter, limit: Option<u64>) -> Result<Vec<car::Model>, ServiceError> {
    Ok(car::list(db, filter, limit).await?)
}

/// Get listing by id.
pub async fn get_car(db: &DatabaseConnection, id: Uuid) -> Result<Option<car::Model>, ServiceError> {
    use sea_orm::EntityTrait;
    Ok(car::Entity::find_by_id(id).one(db).await.map_err(|e| ServiceError::Store(e.to_string()))?)
}

/// Insert a listing pointing at an already uploaded cover.
pub async fn create_car(db: &DatabaseConnection, draft: &CarDraft, cover: &str) -> Result<car::Model, ServiceError> {
    Ok(car::create(db, draft, cover).await?)
}

/// Replace every draft field; the cover only when `cover` is `Some`.
pub async fn update_car(db: &DatabaseConnection, id: Uuid, draft: &CarDraft, cover: Option<&str>) -> Result<Option<car::Model>, ServiceError> {
    Ok(car::replace(db, id, draft, cover).await?)
}

/// Delete listing; `false` when nothing matched.
pub async fn delete_car(db: &DatabaseConnection, id: Uuid) -> Result<bool, ServiceError> {
    Ok(car::hard_delete(db, id).await?)
}
