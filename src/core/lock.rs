//! Mutex helper.

use std::sync::{Mutex, MutexGuard};

/// Acquire `mutex`, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate is a single read or write of the
/// guarded value, so a poisoned lock still guards a consistent value.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
