//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use lazypipe::{Cleanup, Duplicate, Error, Result};

/// Counts live `Tracked` values so tests can assert nothing leaked.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    live: Rc<Cell<isize>>,
    disposed: Rc<Cell<usize>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracked value.
    pub fn track(&self, value: i64) -> Tracked {
        self.live.set(self.live.get() + 1);
        Tracked {
            value,
            ledger: self.clone(),
        }
    }

    pub fn track_all(&self, values: &[i64]) -> Vec<Tracked> {
        values.iter().map(|&v| self.track(v)).collect()
    }

    /// Values created and not yet dropped.
    pub fn live(&self) -> isize {
        self.live.get()
    }

    /// Calls to `Cleanup::dispose`.
    pub fn disposed(&self) -> usize {
        self.disposed.get()
    }
}

/// Element whose copies and drops are recorded in a `Ledger`.
#[derive(Debug)]
pub struct Tracked {
    pub value: i64,
    ledger: Ledger,
}

impl Duplicate for Tracked {
    fn duplicate(&self) -> Result<Self> {
        Ok(self.ledger.track(self.value))
    }
}

impl Cleanup for Tracked {
    fn dispose(&mut self) {
        self.ledger.disposed.set(self.ledger.disposed.get() + 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.live.set(self.ledger.live.get() - 1);
    }
}

/// Value that refuses deep duplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Pinned(pub u32);

impl Duplicate for Pinned {
    fn duplicate(&self) -> Result<Self> {
        Err(Error::duplication_unsupported::<Self>())
    }
}

/// Stage function that fails on one specific value.
pub fn fail_on(bad: i64) -> impl FnMut(i64) -> Result<i64> + Clone {
    move |value| {
        if value == bad {
            Err(Error::function(format!("refusing {value}")))
        } else {
            Ok(value)
        }
    }
}
