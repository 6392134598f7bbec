mod incentive_estimate;
mod ppm;
mod ppm_size;
mod request_key;
mod weight_range;

pub use incentive_estimate::IncentiveEstimate;
pub use ppm::{NewPpmRecord, PpmRecord};
pub use ppm_size::PpmSize;
pub use request_key::RequestKey;
pub use weight_range::WeightRange;

#[cfg(test)]
pub(crate) use ppm::fixtures;
