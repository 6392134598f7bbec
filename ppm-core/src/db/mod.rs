pub mod factory;
pub mod repository;

pub use factory::{DEFAULT_DATABASE_FILE, DbConfig, IN_MEMORY, RepositoryFactory, RepositoryRegistry};
pub use repository::{PpmRepository, RepositoryError};
