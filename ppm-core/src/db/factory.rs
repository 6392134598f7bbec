//! Choosing where PPM records are stored.
//!
//! The `[database]` table of the settings file deserializes straight into
//! [`DbConfig`]. Each storage crate contributes a [`RepositoryFactory`], and
//! the front end opens its repository through a [`RepositoryRegistry`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repository::{PpmRepository, RepositoryError};

/// Database file used when the settings leave it out.
pub const DEFAULT_DATABASE_FILE: &str = "moves.db";

/// Connection string for a throwaway SQLite database.
pub const IN_MEMORY: &str = ":memory:";

/// The `[database]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Name of a registered backend, e.g. `sqlite`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// For SQLite: a file path, created on first use, or `:memory:`.
    #[serde(default = "default_connection_string")]
    pub connection_string: String,
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_connection_string() -> String {
    DEFAULT_DATABASE_FILE.to_string()
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_string: default_connection_string(),
        }
    }
}

impl DbConfig {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            backend: default_backend(),
            connection_string: path.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::sqlite(IN_MEMORY)
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection_string == IN_MEMORY
    }

    /// Backend names are lowercase ASCII words; the connection string must
    /// name something.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        let backend = self.backend.as_str();
        if backend.is_empty()
            || !backend
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(RepositoryError::Configuration(format!(
                "backend must be a lowercase name like 'sqlite' (got '{backend}')"
            )));
        }
        if self.connection_string.trim().is_empty() {
            return Err(RepositoryError::Configuration(format!(
                "connection_string for backend '{backend}' must not be empty"
            )));
        }
        Ok(())
    }
}

/// Opens repositories for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Connects and brings the schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PpmRepository>, RepositoryError>;
}

/// The storage backends this build knows about.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a backend. A later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names, in order.
    pub fn backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Validates `config` and opens it with the matching backend.
    ///
    /// # Errors
    /// [`RepositoryError::Configuration`] for invalid settings or an unknown
    /// backend; otherwise whatever the backend reports.
    pub async fn open(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn PpmRepository>, RepositoryError> {
        config.validate()?;
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; this build supports {}",
                config.backend,
                self.backends().join(", ")
            )));
        };
        debug!(
            backend = %config.backend,
            in_memory = config.is_in_memory(),
            "opening PPM repository"
        );
        factory.create(config).await
    }
}
