//! Scoped `TEXTPORT_*` overrides for configuration tests.

use crate::config::ENV_PREFIX;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Temporarily rewrites `TEXTPORT_*` variables for one test.
///
/// Holds the process-wide env mutex for its whole lifetime, so overlays in
/// concurrent tests never interleave. Previous values come back on drop, in
/// reverse order of assignment.
pub(crate) struct TextportEnv {
    saved: Vec<(String, Option<String>)>,
    _serial: MutexGuard<'static, ()>,
}

impl TextportEnv {
    /// Acquire the env mutex with no overrides yet.
    pub(crate) fn lock() -> Self {
        let serial = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Self {
            saved: Vec::new(),
            _serial: serial,
        }
    }

    /// Set `TEXTPORT_<name>` to `value`.
    #[allow(unused_unsafe)]
    pub(crate) fn set(mut self, name: &str, value: &str) -> Self {
        let key = self.remember(name);
        // SAFETY: `_serial` keeps every env writer in this crate's tests serialized.
        unsafe {
            std::env::set_var(key, value);
        }
        self
    }

    /// Remove `TEXTPORT_<name>` for the duration of the overlay.
    #[allow(unused_unsafe)]
    pub(crate) fn unset(mut self, name: &str) -> Self {
        let key = self.remember(name);
        // SAFETY: see `set`.
        unsafe {
            std::env::remove_var(key);
        }
        self
    }

    fn remember(&mut self, name: &str) -> String {
        let key = format!("{ENV_PREFIX}{name}");
        self.saved.push((key.clone(), std::env::var(&key).ok()));
        key
    }
}

impl Drop for TextportEnv {
    #[allow(unused_unsafe)]
    fn drop(&mut self) {
        while let Some((key, previous)) = self.saved.pop() {
            // SAFETY: the mutex guard is still held until after this loop.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(&key, value),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}
