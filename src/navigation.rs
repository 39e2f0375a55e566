//! Host navigation seam.

use std::sync::{Mutex, PoisonError};

/// Read and change the host's current route.
pub trait Navigator: Send + Sync {
    /// Full path of the current route, including query.
    fn current_path(&self) -> String;

    fn navigate_to(&self, path: &str);
}

/// In-memory navigator for headless hosts and server rendering.
/// Records every navigation in order.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new(start: impl Into<String>) -> Self {
        Self { current: Mutex::new(start.into()), history: Mutex::new(Vec::new()) }
    }

    /// Navigations performed through `navigate_to`, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn navigate_to(&self, path: &str) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.to_owned();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
    }
}

#[cfg(test)]
#[path = "navigation_test.rs"]
mod tests;
