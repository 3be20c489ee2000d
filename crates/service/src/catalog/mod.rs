//! Car catalog: validation, listing filters, persistence seam and the
//! orchestrating service. Three-layer layout (validation, repository, service).

pub mod cover;
pub mod filters;
pub mod repository;
pub mod requirements;
pub mod service;
pub mod validation;

pub use cover::{CoverChange, CoverFile};
pub use filters::{ListParams, ListQuery};
pub use repository::{CarRepository, SeaOrmCarRepository};
pub use requirements::Requirements;
pub use service::CatalogService;
pub use validation::{RawCarFields, ValidationErrors};
