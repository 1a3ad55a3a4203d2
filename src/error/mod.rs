//! Error module for Manu Filter.
//!
//! This module provides the application-level error type wrapping the
//! filter and configuration failures, plus a pluggable reporter for
//! errors that cannot be returned to a caller (such as a failed
//! auto-persist after a successful insert).

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use thiserror::Error;

use crate::data_structures::manu_cuckoo_filter::ManuCuckooFilterError;

pub mod config;

/// Result type alias used throughout Manu Filter.
pub type ManuResult<T> = Result<T, ManuError>;

/// Core error enum for Manu Filter.
#[derive(Error, Debug)]
pub enum ManuError {
    /// Errors occurring during configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Errors raised by the cuckoo filter itself.
    #[error("Filter error: {0}")]
    Filter(#[from] ManuCuckooFilterError),
}

/// Error reporting structure to provide context and debugging information.
#[derive(Debug)]
pub struct ErrorContext {
    /// The original error that occurred.
    pub error: ManuError,

    /// The component where the error occurred.
    pub component: String,

    /// Additional context information to help with debugging.
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context with the given error and component.
    ///
    /// # Arguments
    ///
    /// * `error` - The error that occurred
    /// * `component` - The component where the error occurred
    pub fn new<S: Into<String>>(error: ManuError, component: S) -> Self {
        Self {
            error,
            component: component.into(),
            details: None,
        }
    }

    /// Adds detail information to the error context.
    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error in {}: {}", self.component, self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        Ok(())
    }
}

/// Error reporter trait for reporting errors to various sinks.
pub trait ErrorReporter: Send + Sync {
    /// Report an error with context.
    fn report(&self, context: ErrorContext);
}

/// Reporter that logs errors using the tracing framework.
#[derive(Default, Debug)]
pub struct TracingErrorReporter;

impl TracingErrorReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: ErrorContext) {
        tracing::error!(
            error = %context.error,
            component = %context.component,
            details = context.details.as_deref().unwrap_or("None"),
            "Error reported"
        );
    }
}

static ERROR_REPORTER: Lazy<RwLock<Arc<dyn ErrorReporter>>> =
    Lazy::new(|| RwLock::new(Arc::new(TracingErrorReporter)));

/// Set the global error reporter.
///
/// Filters capture the global reporter when they are built; filters created
/// earlier keep the one they captured.
pub fn set_error_reporter(reporter: Arc<dyn ErrorReporter>) {
    *ERROR_REPORTER.write() = reporter;
}

/// Current global error reporter.
pub fn error_reporter() -> Arc<dyn ErrorReporter> {
    ERROR_REPORTER.read().clone()
}
