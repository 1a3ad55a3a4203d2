//! Test modules for Manu Filter.
//!
//! Cross-module tests live here; unit tests for a single file sit in that
//! file's own `tests` module.

pub mod manu_cuckoo_filter_tests;

// Re-export commonly used testing tools to simplify imports in test modules
pub use test_utils::{create_test_dir, item_strategy, lock_global_state, seeded_filter, write_file};
