// Library for tests to access modules

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod params;
pub mod retention_worker;
pub mod routes;
pub mod store;

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");
