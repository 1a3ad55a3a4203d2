// Copyright (c) 2025 Manu Filter Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Lifecycle hooks fired after successful mutations.

use std::fmt;

use crate::data_structures::manu_cuckoo_filter::fingerprint::Fingerprint;

/// Called with the item and its fingerprint after an insert or delete.
pub type ItemHook = Box<dyn Fn(&[u8], Fingerprint) + Send + Sync>;

/// Called with the new bucket count after a resize.
pub type ResizeHook = Box<dyn Fn(usize) + Send + Sync>;

/// Optional callbacks held by a filter.
///
/// Hooks run synchronously on the mutating thread. An unset hook is a no-op.
///
/// # Example
///
/// ```
/// use manu_filter_lib::data_structures::manu_cuckoo_filter::FilterHooks;
///
/// let hooks = FilterHooks::new()
///     .on_resize(|buckets| println!("grew to {buckets} buckets"));
/// ```
#[derive(Default)]
pub struct FilterHooks {
    on_insert: Option<ItemHook>,
    on_delete: Option<ItemHook>,
    on_resize: Option<ResizeHook>,
}

impl FilterHooks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the post-insert hook.
    pub fn on_insert<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[u8], Fingerprint) + Send + Sync + 'static,
    {
        self.on_insert = Some(Box::new(hook));
        self
    }

    /// Register the post-delete hook.
    pub fn on_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&[u8], Fingerprint) + Send + Sync + 'static,
    {
        self.on_delete = Some(Box::new(hook));
        self
    }

    /// Register the post-resize hook.
    pub fn on_resize<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_resize = Some(Box::new(hook));
        self
    }

    pub(crate) fn fire_insert(&self, item: &[u8], fp: Fingerprint) {
        if let Some(hook) = &self.on_insert {
            hook(item, fp);
        }
    }

    pub(crate) fn fire_delete(&self, item: &[u8], fp: Fingerprint) {
        if let Some(hook) = &self.on_delete {
            hook(item, fp);
        }
    }

    pub(crate) fn fire_resize(&self, bucket_count: usize) {
        if let Some(hook) = &self.on_resize {
            hook(bucket_count);
        }
    }
}

impl fmt::Debug for FilterHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterHooks")
            .field("on_insert", &self.on_insert.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .field("on_resize", &self.on_resize.is_some())
            .finish()
    }
}
