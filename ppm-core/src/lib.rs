pub mod calculations;
pub mod db;
pub mod fields;
pub mod models;
pub mod service;
pub mod session;
pub mod sync;

pub use db::repository::{PpmRepository, RepositoryError};
pub use models::*;
pub use service::{EstimateService, EstimateServiceError};
pub use session::AuthSession;
pub use sync::{EstimateSynchronizer, SyncCommand, SyncEvent, SyncOutput};
