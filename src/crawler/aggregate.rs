//! Shared result aggregates written by workers

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

/// A mutex-guarded value shared between worker tasks
///
/// Updates run under the lock in a synchronous closure, so no await point can
/// ever hold it. A worker that panicked while holding the lock does not
/// poison the aggregate for the others.
#[derive(Debug)]
pub struct Aggregate<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Aggregate<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Aggregate<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Runs `f` with exclusive access to the value
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Takes the value out, leaving a default in its place
    pub fn take(&self) -> T
    where
        T: Default,
    {
        self.update(std::mem::take)
    }
}

/// Detail URLs merged from every listing page
#[derive(Debug, Default)]
pub struct LinkSet {
    pub urls: BTreeSet<String>,
    /// Links already present when merged
    pub duplicates: usize,
}

impl LinkSet {
    pub fn merge(&mut self, links: &BTreeSet<String>) {
        for link in links {
            if !self.urls.insert(link.clone()) {
                self.duplicates += 1;
            }
        }
    }
}
