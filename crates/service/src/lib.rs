//! Service layer for the car catalog.
//! - `catalog` owns the list/get/create/update/delete operations and the
//!   cover image lifecycle.
//! - `auth`, `blob` and the repository trait are the seams to the external
//!   collaborators (token verification, object storage, datastore).
//! - Validation lives in `catalog::validation` and is pure.

pub mod errors;
pub mod auth;
pub mod blob;
pub mod catalog;
pub mod db;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
