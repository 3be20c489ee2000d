use std::sync::Arc;

use chrono::Utc;
use models::car;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::cover::{CoverChange, CoverFile};
use super::filters::ListQuery;
use super::repository::CarRepository;
use super::requirements::Requirements;
use super::validation::{self, RawCarFields};
use crate::auth::domain::Subject;
use crate::auth::errors::AuthError;
use crate::auth::CredentialVerifier;
use crate::blob::{cover_key, BlobStore};
use crate::errors::ServiceError;

/// Application service for the car catalog.
///
/// Owns the cover image lifecycle: a listing only ever points at an uploaded
/// blob, and superseded or orphaned blobs are removed by detached cleanup
/// tasks whose outcome never reaches the caller.
///
/// ```
/// use std::sync::Arc;
/// use service::auth::verifier::mock::StaticVerifier;
/// use service::blob::mock::InMemoryBlobStore;
/// use service::catalog::repository::mock::InMemoryCarRepository;
/// use service::catalog::{CatalogService, ListParams};
///
/// let svc = CatalogService::new(
///     Arc::new(InMemoryCarRepository::new()),
///     Arc::new(InMemoryBlobStore::default()),
///     Arc::new(StaticVerifier::new("tok", "admin")),
/// );
/// let rows = tokio_test::block_on(svc.list(&ListParams::default().into_query())).unwrap();
/// assert!(rows.is_empty());
/// ```
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CarRepository>,
    blobs: Arc<dyn BlobStore>,
    verifier: Arc<dyn CredentialVerifier>,
    requirements: Requirements,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CarRepository>, blobs: Arc<dyn BlobStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { repo, blobs, verifier, requirements: Requirements::all() }
    }

    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn requirements(&self) -> Requirements { self.requirements }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<car::Model>, ServiceError> {
        self.requirements.check_read()?;
        self.repo.list(&query.filter, query.limit).await
    }

    pub async fn get(&self, id: Uuid) -> Result<car::Model, ServiceError> {
        self.requirements.check_read()?;
        self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("car"))
    }

    /// Settings and credential check for a write, done before a request body
    /// is read. The write operations repeat it themselves.
    pub fn admit_write(&self, credential: Option<&str>) -> Result<(), ServiceError> {
        self.requirements.check_write()?;
        self.authorize(credential).map(|_| ())
    }

    /// Validate, upload the cover, then persist. No record without a cover,
    /// no cover left behind when the insert fails.
    #[instrument(skip_all, fields(service = "catalog", op = "create"))]
    pub async fn create(
        &self,
        credential: Option<&str>,
        fields: &RawCarFields,
        cover: Option<CoverFile>,
    ) -> Result<car::Model, ServiceError> {
        self.requirements.check_write()?;
        let subject = self.authorize(credential)?;
        let Some(cover) = cover else { return Err(ServiceError::MissingImage) };
        let draft = validation::validate(fields, Some(&cover))?;

        let url = self.upload(&cover).await?;
        match self.repo.insert(&draft, &url).await {
            Ok(row) => {
                info!(event = "car_created", car_id = %row.id, subject = subject.as_str(), url = %row.cover, "listing created");
                Ok(row)
            }
            Err(e) => {
                error!(event = "store_failed", err = %e, "insert failed after upload");
                self.cleanup_detached(url);
                Err(e)
            }
        }
    }

    /// Full-field replacement. With `CoverChange::Replace` the new blob is
    /// uploaded first; the old one is removed only after the record points at
    /// the new one.
    #[instrument(skip_all, fields(service = "catalog", op = "update", car_id = %id))]
    pub async fn update(
        &self,
        credential: Option<&str>,
        id: Uuid,
        fields: &RawCarFields,
        cover: CoverChange,
    ) -> Result<car::Model, ServiceError> {
        self.requirements.check_write()?;
        let subject = self.authorize(credential)?;
        let existing = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("car"))?;

        let new_file = match &cover {
            CoverChange::Keep => None,
            CoverChange::Replace(file) => Some(file),
        };
        let draft = validation::validate(fields, new_file)?;

        let new_url = match new_file {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        match self.repo.update(id, &draft, new_url.as_deref()).await {
            Ok(Some(row)) => {
                info!(event = "car_updated", car_id = %id, subject = subject.as_str(), cover_replaced = new_url.is_some(), "listing updated");
                if new_url.is_some() && existing.cover != row.cover {
                    self.cleanup_detached(existing.cover);
                }
                Ok(row)
            }
            Ok(None) => {
                // deleted concurrently
                if let Some(url) = new_url { self.cleanup_detached(url); }
                Err(ServiceError::not_found("car"))
            }
            Err(e) => {
                error!(event = "store_failed", car_id = %id, err = %e, "update failed");
                if let Some(url) = new_url { self.cleanup_detached(url); }
                Err(e)
            }
        }
    }

    /// Remove the record, then dispatch cover cleanup.
    #[instrument(skip_all, fields(service = "catalog", op = "delete", car_id = %id))]
    pub async fn delete(&self, credential: Option<&str>, id: Uuid) -> Result<(), ServiceError> {
        self.requirements.check_write()?;
        let subject = self.authorize(credential)?;
        let existing = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("car"))?;

        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("car"));
        }
        info!(event = "car_deleted", car_id = %id, subject = subject.as_str(), "listing deleted");
        self.cleanup_detached(existing.cover);
        Ok(())
    }

    fn authorize(&self, credential: Option<&str>) -> Result<Subject, ServiceError> {
        let token = credential.map(str::trim).filter(|t| !t.is_empty()).ok_or(AuthError::Missing)?;
        self.verifier.verify(token).map_err(|e| {
            debug!(err = %e, "credential rejected");
            ServiceError::from(e)
        })
    }

    async fn upload(&self, file: &CoverFile) -> Result<String, ServiceError> {
        let key = cover_key(&file.filename, Utc::now().timestamp_millis());
        match self.blobs.put(&key, file.bytes.clone(), &file.content_type).await {
            Ok(url) => {
                debug!(event = "cover_uploaded", key = %key, url = %url, size = file.size());
                Ok(url)
            }
            Err(e) => {
                error!(event = "upload_failed", key = %key, err = %e, "cover upload failed");
                Err(ServiceError::UploadFailed(e.to_string()))
            }
        }
    }

    /// Best-effort blob removal on a detached task.
    fn cleanup_detached(&self, url: String) {
        if url.is_empty() || !self.blobs.owns(&url) {
            debug!(url = %url, "skipping cleanup of foreign url");
            return;
        }
        let blobs = Arc::clone(&self.blobs);
        tokio::spawn(async move {
            match blobs.delete(&url).await {
                Ok(()) => info!(event = "cleanup_done", url = %url),
                Err(e) => warn!(event = "cleanup_failed", url = %url, err = %e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::mock::StaticVerifier;
    use crate::blob::mock::{InMemoryBlobStore, MEMORY_BASE};
    use crate::catalog::filters::ListParams;
    use crate::catalog::repository::mock::InMemoryCarRepository;
    use crate::catalog::validation::ErrorKind;
    use models::enums::{Brand, CarType, PriceRange};

    const TOKEN: &str = "operator-token";

    struct Fixture {
        svc: CatalogService,
        repo: Arc<InMemoryCarRepository>,
        blobs: Arc<InMemoryBlobStore>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryCarRepository::new());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let svc = CatalogService::new(repo.clone(), blobs.clone(), Arc::new(StaticVerifier::new(TOKEN, "admin")));
        Fixture { svc, repo, blobs }
    }

    fn clio() -> RawCarFields {
        let mut raw = RawCarFields::default();
        for (k, v) in [
            ("name", "Clio"),
            ("type", "Economy"),
            ("brand", "Renault"),
            ("gamme", "Budget"),
            ("price", "250"),
            ("seats", "5"),
            ("doors", "4"),
            ("quantity", "3"),
        ] {
            raw.set(k, v.to_string());
        }
        raw
    }

    fn jpeg(name: &str) -> CoverFile {
        CoverFile::new(name, "image/jpeg", vec![0xFFu8; 2 * 1024 * 1024])
    }

    async fn created(f: &Fixture) -> car::Model {
        f.svc.create(Some(TOKEN), &clio(), Some(jpeg("clio.jpg"))).await.unwrap()
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let f = fixture();
        let row = created(&f).await;
        assert!(row.cover.starts_with(&format!("{MEMORY_BASE}/cars/clio_")), "{}", row.cover);
        assert!(f.blobs.contains(&row.cover));

        let got = f.svc.get(row.id).await.unwrap();
        assert_eq!(got, row);
        assert_eq!(got.car_type, CarType::Economy);
        assert_eq!(got.brand, Brand::Renault);
        assert_eq!(got.gamme, PriceRange::Budget);
        assert_eq!((got.seats, got.doors, got.quantity), (5, 4, 3));
        assert_eq!(f.repo.len(), 1);
    }

    #[tokio::test]
    async fn create_without_cover_is_missing_image_and_writes_nothing() {
        let f = fixture();
        let err = f.svc.create(Some(TOKEN), &clio(), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingImage));
        assert_eq!(f.repo.write_count(), 0);
        assert!(f.blobs.puts().is_empty());
    }

    #[tokio::test]
    async fn create_requires_credential() {
        let f = fixture();
        let err = f.svc.create(None, &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
        let err = f.svc.create(Some("  "), &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
        let err = f.svc.create(Some("forged"), &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredential));
        assert_eq!(f.repo.write_count(), 0);
        assert!(f.blobs.puts().is_empty());
    }

    #[tokio::test]
    async fn invalid_fields_upload_nothing() {
        let f = fixture();
        let mut raw = clio();
        raw.set("seats", "42".into());
        raw.set("brand", "Tesla".into());
        let err = f.svc.create(Some(TOKEN), &raw, Some(jpeg("a.jpg"))).await.unwrap_err();
        let ServiceError::Validation(errs) = err else { panic!("expected validation error") };
        assert!(errs.has("seats", ErrorKind::InvalidRange));
        assert!(errs.has("brand", ErrorKind::InvalidEnum));
        assert!(f.blobs.puts().is_empty());
        assert_eq!(f.repo.write_count(), 0);
    }

    #[tokio::test]
    async fn non_image_cover_is_invalid_file() {
        let f = fixture();
        let pdf = CoverFile::new("a.pdf", "application/pdf", vec![1u8; 16]);
        let err = f.svc.create(Some(TOKEN), &clio(), Some(pdf)).await.unwrap_err();
        let ServiceError::Validation(errs) = err else { panic!("expected validation error") };
        assert!(errs.has("cover", ErrorKind::InvalidFile));
    }

    #[tokio::test]
    async fn upload_failure_creates_no_record() {
        let f = fixture();
        f.blobs.set_fail_puts(true);
        let err = f.svc.create(Some(TOKEN), &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::UploadFailed(_)));
        assert!(f.repo.is_empty());
    }

    #[tokio::test]
    async fn insert_failure_removes_fresh_blob() {
        let f = fixture();
        f.repo.set_fail(true);
        let err = f.svc.create(Some(TOKEN), &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        let uploaded = f.blobs.puts();
        assert_eq!(uploaded.len(), 1);
        assert!(f.blobs.wait_for_deletes(1).await);
        assert_eq!(f.blobs.deletes(), uploaded);
        assert_eq!(f.blobs.object_count(), 0);
    }

    #[tokio::test]
    async fn update_with_new_cover_swaps_and_cleans_old() {
        let f = fixture();
        let row = created(&f).await;
        let old = row.cover.clone();

        let mut raw = clio();
        raw.set("quantity", "9".into());
        let updated = f
            .svc
            .update(Some(TOKEN), row.id, &raw, CoverChange::Replace(jpeg("clio-2024.jpg")))
            .await
            .unwrap();
        assert_ne!(updated.cover, old);
        assert!(updated.cover.contains("/cars/clio-2024_"), "{}", updated.cover);
        assert_eq!(updated.quantity, 9);
        assert_eq!(f.svc.get(row.id).await.unwrap().cover, updated.cover);

        assert!(f.blobs.wait_for_deletes(1).await);
        assert_eq!(f.blobs.deletes(), vec![old.clone()]);
        assert!(!f.blobs.contains(&old));
        assert!(f.blobs.contains(&updated.cover));
    }

    #[tokio::test]
    async fn failed_old_cover_delete_does_not_fail_update() {
        let f = fixture();
        let row = created(&f).await;
        f.blobs.set_fail_deletes(true);
        let updated = f
            .svc
            .update(Some(TOKEN), row.id, &clio(), CoverChange::Replace(jpeg("b.jpg")))
            .await
            .unwrap();
        assert!(f.blobs.wait_for_deletes(1).await);
        // attempt was made; record still points at the new image
        assert_eq!(f.blobs.deletes(), vec![row.cover]);
        assert_eq!(f.svc.get(row.id).await.unwrap().cover, updated.cover);
    }

    #[tokio::test]
    async fn update_without_cover_keeps_it_byte_for_byte() {
        let f = fixture();
        let row = created(&f).await;
        for name in ["Clio V", "Clio V"] {
            let mut raw = clio();
            raw.set("name", name.into());
            let updated = f.svc.update(Some(TOKEN), row.id, &raw, CoverChange::Keep).await.unwrap();
            assert_eq!(updated.cover, row.cover);
            assert_eq!(updated.name, "Clio V");
            assert_eq!(updated.created_at, row.created_at);
        }
        assert_eq!(f.blobs.puts().len(), 1);
        assert!(f.blobs.deletes().is_empty());
    }

    #[tokio::test]
    async fn update_upload_failure_leaves_record_unchanged() {
        let f = fixture();
        let row = created(&f).await;
        f.blobs.set_fail_puts(true);
        let mut raw = clio();
        raw.set("name", "Changed".into());
        let err = f.svc.update(Some(TOKEN), row.id, &raw, CoverChange::Replace(jpeg("c.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::UploadFailed(_)));
        assert_eq!(f.svc.get(row.id).await.unwrap(), row);
    }

    #[tokio::test]
    async fn update_of_vanished_record_cleans_new_blob() {
        let f = fixture();
        let row = created(&f).await;
        f.repo.set_vanish_on_update(true);
        let err = f.svc.update(Some(TOKEN), row.id, &clio(), CoverChange::Replace(jpeg("d.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(f.blobs.wait_for_deletes(1).await);
        let puts = f.blobs.puts();
        assert_eq!(f.blobs.deletes(), vec![puts[1].clone()]);
    }

    #[tokio::test]
    async fn update_store_failure_cleans_new_blob_and_keeps_record() {
        let f = fixture();
        let row = created(&f).await;
        f.repo.set_fail_updates(true);
        let mut raw = clio();
        raw.set("name", "Changed".into());
        let err = f.svc.update(Some(TOKEN), row.id, &raw, CoverChange::Replace(jpeg("e.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));

        assert!(f.blobs.wait_for_deletes(1).await);
        let puts = f.blobs.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(f.blobs.deletes(), vec![puts[1].clone()]);
        assert!(f.blobs.contains(&row.cover));
        assert_eq!(f.svc.get(row.id).await.unwrap(), row);
    }

    #[tokio::test]
    async fn admit_write_checks_settings_then_credential() {
        let f = fixture();
        assert!(f.svc.admit_write(Some(TOKEN)).is_ok());
        assert!(matches!(f.svc.admit_write(None), Err(ServiceError::Unauthorized)));
        assert!(matches!(f.svc.admit_write(Some("forged")), Err(ServiceError::InvalidCredential)));

        let svc = f.svc.clone().with_requirements(Requirements { blob_store: false, ..Requirements::all() });
        assert!(matches!(svc.admit_write(None), Err(ServiceError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.svc.update(Some(TOKEN), Uuid::new_v4(), &clio(), CoverChange::Keep).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_checks_credential_before_existence() {
        let f = fixture();
        let err = f.svc.update(None, Uuid::new_v4(), &clio(), CoverChange::Keep).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn delete_removes_record_and_cover() {
        let f = fixture();
        let row = created(&f).await;
        f.svc.delete(Some(TOKEN), row.id).await.unwrap();
        assert!(matches!(f.svc.get(row.id).await, Err(ServiceError::NotFound(_))));
        assert!(f.blobs.wait_for_deletes(1).await);
        assert_eq!(f.blobs.deletes(), vec![row.cover]);

        let again = f.svc.delete(Some(TOKEN), row.id).await.unwrap_err();
        assert!(matches!(again, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_survives_cleanup_failure() {
        let f = fixture();
        let row = created(&f).await;
        f.blobs.set_fail_deletes(true);
        f.svc.delete(Some(TOKEN), row.id).await.unwrap();
        assert!(f.blobs.wait_for_deletes(1).await);
        assert!(f.repo.is_empty());
    }

    #[tokio::test]
    async fn foreign_cover_is_never_deleted() {
        let f = fixture();
        let row = car::new_model(&validation::validate(&clio(), None).unwrap(), "https://cdn.example.com/legacy.jpg");
        f.repo.seed(row.clone());
        f.svc.delete(Some(TOKEN), row.id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(f.blobs.deletes().is_empty());
    }

    #[tokio::test]
    async fn list_all_sentinel_matches_no_filter() {
        let f = fixture();
        for brand in ["Renault", "Dacia", "Peugeot"] {
            let mut raw = clio();
            raw.set("brand", brand.into());
            f.svc.create(Some(TOKEN), &raw, Some(jpeg("x.jpg"))).await.unwrap();
        }
        let with_all = ListParams { brand: Some("All".into()), ..Default::default() }.into_query();
        let none = ListParams::default().into_query();
        let a: Vec<Uuid> = f.svc.list(&with_all).await.unwrap().iter().map(|r| r.id).collect();
        let b: Vec<Uuid> = f.svc.list(&none).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);

        let dacia = ListParams { brand: Some("Dacia".into()), ..Default::default() }.into_query();
        let rows = f.svc.list(&dacia).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].brand, Brand::Dacia);
    }

    #[tokio::test]
    async fn list_limit_returns_newest_first() {
        let f = fixture();
        let base = Utc::now();
        let draft = validation::validate(&clio(), None).unwrap();
        let mut ids = Vec::new();
        for i in 0..10 {
            let mut row = car::new_model(&draft, &format!("{MEMORY_BASE}/cars/{i}.jpg"));
            row.created_at = (base + chrono::Duration::seconds(i)).into();
            ids.push(row.id);
            f.repo.seed(row);
        }
        let q = ListParams { limit: Some("3".into()), ..Default::default() }.into_query();
        let rows = f.svc.list(&q).await.unwrap();
        let got: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[9], ids[8], ids[7]]);
    }

    #[tokio::test]
    async fn misconfiguration_is_reported_before_side_effects() {
        let f = fixture();
        let svc = f.svc.clone().with_requirements(Requirements { token_secret: false, ..Requirements::all() });
        let err = svc.create(Some(TOKEN), &clio(), Some(jpeg("a.jpg"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Misconfigured(ref m) if m.contains("JWT_SECRET")));
        assert!(f.blobs.puts().is_empty());
        // reads only need the database
        assert!(svc.list(&ListQuery::default()).await.is_ok());

        let no_db = f.svc.clone().with_requirements(Requirements { database: false, ..Requirements::all() });
        assert!(matches!(no_db.get(Uuid::new_v4()).await, Err(ServiceError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn store_errors_pass_through_on_reads() {
        let f = fixture();
        f.repo.set_fail(true);
        assert!(matches!(f.svc.list(&ListQuery::default()).await, Err(ServiceError::Store(_))));
    }
}
