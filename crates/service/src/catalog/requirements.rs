use configs::AppConfig;

use crate::errors::ServiceError;

/// Which collaborator settings are present. Operations check the ones they
/// need before doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub database: bool,
    pub blob_store: bool,
    pub token_secret: bool,
}

impl Requirements {
    pub fn all() -> Self {
        Self { database: true, blob_store: true, token_secret: true }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let missing = cfg.missing_settings();
        Self {
            database: !missing.contains(&"DATABASE_URL"),
            blob_store: !missing.contains(&"BLOB_READ_WRITE_TOKEN"),
            token_secret: !missing.contains(&"JWT_SECRET"),
        }
    }

    /// Reads need the datastore only.
    pub fn check_read(&self) -> Result<(), ServiceError> {
        if !self.database {
            return Err(ServiceError::Misconfigured("DATABASE_URL is not set".into()));
        }
        Ok(())
    }

    /// Mutations need every collaborator.
    pub fn check_write(&self) -> Result<(), ServiceError> {
        let mut missing = Vec::new();
        if !self.database { missing.push("DATABASE_URL"); }
        if !self.blob_store { missing.push("BLOB_READ_WRITE_TOKEN"); }
        if !self.token_secret { missing.push("JWT_SECRET"); }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Misconfigured(format!("{} not set", missing.join(", "))))
        }
    }
}
