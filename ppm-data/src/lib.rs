pub mod loader;

pub use loader::{PpmCsvRecord, PpmLoader, PpmLoaderError};
