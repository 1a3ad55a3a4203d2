//! Manu Filter Library
//!
//! A resizable cuckoo filter: approximate set membership with deletion,
//! automatic growth and file snapshots. The library backs the
//! `manu-filter` binary and can be used on its own.
//!
//! # Architecture
//!
//! - [`data_structures::manu_cuckoo_filter`] holds the filter and its
//!   bucket store, eviction, resize and persistence machinery.
//! - [`config`] loads layered settings from files and the environment.
//! - [`error`] defines the application error type and error reporting.

// Re-export public modules
pub mod config;
pub mod data_structures;
pub mod error;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for Manu Filter.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization function.
///
/// Installs the tracing error reporter and makes `config` the global
/// configuration, which is returned.
///
/// # Errors
///
/// Fails if the global configuration was already initialized.
pub fn init(config: config::ManuConfig) -> error::ManuResult<&'static config::ManuConfig> {
    error::set_error_reporter(std::sync::Arc::new(error::TracingErrorReporter::new()));

    config::init_global_config(config)?;

    config::global_config().ok_or_else(|| error::config::ConfigError::AlreadyInitialized.into())
}
