pub mod app;
pub mod config;
pub mod estimator;
pub mod logging;
