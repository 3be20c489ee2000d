use async_trait::async_trait;
use models::car::{self, CarDraft, CarFilter};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Persistence seam for listings. Single-record operations are atomic;
/// concurrent updates to one id are last-writer-wins.
#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn list(&self, filter: &CarFilter, limit: Option<u64>) -> Result<Vec<car::Model>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<car::Model>, ServiceError>;
    async fn insert(&self, draft: &CarDraft, cover: &str) -> Result<car::Model, ServiceError>;
    /// `None` when the record does not exist (anymore).
    async fn update(&self, id: Uuid, draft: &CarDraft, cover: Option<&str>) -> Result<Option<car::Model>, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmCarRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCarRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl CarRepository for SeaOrmCarRepository {
    async fn list(&self, filter: &CarFilter, limit: Option<u64>) -> Result<Vec<car::Model>, ServiceError> {
        crate::db::car_service::list_cars(&self.db, filter, limit).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<car::Model>, ServiceError> {
        crate::db::car_service::get_car(&self.db, id).await
    }

    async fn insert(&self, draft: &CarDraft, cover: &str) -> Result<car::Model, ServiceError> {
        crate::db::car_service::create_car(&self.db, draft, cover).await
    }

    async fn update(&self, id: Uuid, draft: &CarDraft, cover: Option<&str>) -> Result<Option<car::Model>, ServiceError> {
        crate::db::car_service::update_car(&self.db, id, draft, cover).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        crate::db::car_service::delete_car(&self.db, id).await
    }
}

/// In-memory repository for tests and local demos
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryCarRepository {
        // (insertion sequence, row)
        rows: Mutex<Vec<(u64, car::Model)>>,
        seq: AtomicUsize,
        writes: AtomicUsize,
        fail: AtomicBool,
        fail_updates: AtomicBool,
        vanish_on_update: AtomicBool,
    }

    impl InMemoryCarRepository {
        pub fn new() -> Self { Self::default() }

        /// Insert a row directly, bypassing failure injection and write counting.
        pub fn seed(&self, row: car::Model) {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) as u64;
            self.rows.lock().unwrap().push((seq, row));
        }

        /// Make every subsequent call fail with `ServiceError::Store`.
        pub fn set_fail(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }

        /// Fail only `update`, leaving reads working.
        pub fn set_fail_updates(&self, fail: bool) { self.fail_updates.store(fail, Ordering::SeqCst); }

        /// Simulate a concurrent delete: the next update finds nothing.
        pub fn set_vanish_on_update(&self, vanish: bool) { self.vanish_on_update.store(vanish, Ordering::SeqCst); }

        /// Successful insert/update/delete calls.
        pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }

        pub fn len(&self) -> usize { self.rows.lock().unwrap().len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }

        fn check(&self) -> Result<(), ServiceError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ServiceError::Store("injected repository failure".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CarRepository for InMemoryCarRepository {
        async fn list(&self, filter: &CarFilter, limit: Option<u64>) -> Result<Vec<car::Model>, ServiceError> {
            self.check()?;
            let mut rows: Vec<(u64, car::Model)> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, r)| filter.matches(r))
                .cloned()
                .collect();
            rows.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
            let mut out: Vec<car::Model> = rows.into_iter().map(|(_, r)| r).collect();
            if let Some(n) = limit { out.truncate(n as usize); }
            Ok(out)
        }

        async fn get(&self, id: Uuid) -> Result<Option<car::Model>, ServiceError> {
            self.check()?;
            Ok(self.rows.lock().unwrap().iter().find(|(_, r)| r.id == id).map(|(_, r)| r.clone()))
        }

        async fn insert(&self, draft: &CarDraft, cover: &str) -> Result<car::Model, ServiceError> {
            self.check()?;
            let row = car::new_model(draft, cover);
            self.seed(row.clone());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(row)
        }

        async fn update(&self, id: Uuid, draft: &CarDraft, cover: Option<&str>) -> Result<Option<car::Model>, ServiceError> {
            self.check()?;
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(ServiceError::Store("injected update failure".into()));
            }
            if self.vanish_on_update.swap(false, Ordering::SeqCst) {
                self.rows.lock().unwrap().retain(|(_, r)| r.id != id);
                return Ok(None);
            }
            let mut rows = self.rows.lock().unwrap();
            let Some((_, row)) = rows.iter_mut().find(|(_, r)| r.id == id) else { return Ok(None) };
            row.apply_draft(draft);
            if let Some(url) = cover { row.cover = url.to_string(); }
            row.updated_at = chrono::Utc::now().into();
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(Some(row.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(_, r)| r.id != id);
            let removed = rows.len() < before;
            if removed { self.writes.fetch_add(1, Ordering::SeqCst); }
            Ok(removed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemoryCarRepository;
    use super::*;
    use models::enums::{Brand, CarType, PriceRange};

    fn draft(brand: Brand) -> CarDraft {
        CarDraft {
            name: "Sandero".into(),
            car_type: CarType::Economy,
            brand,
            gamme: PriceRange::Budget,
            price: "180".into(),
            seats: 5,
            doors: 5,
            transmission: None,
            fuel_type: None,
            air_conditioning: false,
            quantity: 4,
        }
    }

    #[tokio::test]
    async fn ties_keep_newest_insert_first() {
        let repo = InMemoryCarRepository::new();
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut row = car::new_model(&draft(Brand::Dacia), "memory://blobs/cars/x.jpg");
            row.created_at = now;
            ids.push(row.id);
            repo.seed(row);
        }
        let rows = repo.list(&CarFilter::default(), None).await.unwrap();
        let got: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        ids.reverse();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn update_missing_returns_none_and_counts_nothing() {
        let repo = InMemoryCarRepository::new();
        assert!(repo.update(Uuid::new_v4(), &draft(Brand::Kia), None).await.unwrap().is_none());
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(repo.write_count(), 0);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_store_error() {
        let repo = InMemoryCarRepository::new();
        repo.set_fail(true);
        let err = repo.insert(&draft(Brand::Fiat), "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(repo.is_empty());
    }
}
