//! Buffered state behind an OrderBy stage

use std::mem;
use std::vec;

use tracing::trace;

use super::operation::Comparator;
use crate::iterator::Cursor;
use crate::{Error, Result};

/// Buffering limits for an OrderBy stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferConfig {
    /// Capacity reserved before the first buffered value
    pub initial_capacity: usize,
    /// Upper bound on buffered values; `None` is unbounded
    pub max_buffered: Option<usize>,
}

impl BufferConfig {
    /// Unbounded buffer with no preallocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `capacity` slots up front.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Fail the pipeline once more than `limit` values would be buffered.
    pub fn with_max_buffered(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidConfiguration(
                "max_buffered must be at least 1".to_string(),
            ));
        }
        self.max_buffered = Some(limit);
        Ok(self)
    }
}

enum Phase<T> {
    Collecting(Vec<T>),
    Draining(vec::IntoIter<T>),
    Finished,
}

/// Collect-sort-drain state machine.
pub(crate) struct Deferred<T> {
    phase: Phase<T>,
    config: BufferConfig,
    duplicate: fn(&T) -> Result<T>,
}

impl<T> Deferred<T> {
    pub(crate) fn new(config: BufferConfig, duplicate: fn(&T) -> Result<T>) -> Self {
        Self {
            phase: Phase::Collecting(Vec::new()),
            config,
            duplicate,
        }
    }

    /// Next value in sorted order. The first call drains `source` entirely.
    pub(crate) fn next_sorted(
        &mut self,
        source: &mut dyn Cursor<T>,
        comparator: &mut dyn Comparator<T>,
    ) -> Result<Option<T>> {
        loop {
            match &mut self.phase {
                Phase::Collecting(buffer) => {
                    if let Err(err) = fill(buffer, source, &self.config, self.duplicate) {
                        // Never sort a partial buffer; collect from the start next pull.
                        trace!(%err, "order_by: collection failed, discarding buffer");
                        self.phase = Phase::Collecting(Vec::new());
                        source.reset();
                        return Err(err);
                    }
                    let mut sorted = mem::take(buffer);
                    trace!(buffered = sorted.len(), "order_by: source exhausted, sorting");
                    sorted.sort_unstable_by(|a, b| {
                        if comparator.less_than(a, b) {
                            std::cmp::Ordering::Less
                        } else if comparator.less_than(b, a) {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    });
                    self.phase = Phase::Draining(sorted.into_iter());
                }
                Phase::Draining(items) => {
                    if let Some(item) = items.next() {
                        return Ok(Some(item));
                    }
                    trace!("order_by: buffer drained");
                    self.phase = Phase::Finished;
                }
                Phase::Finished => return Ok(None),
            }
        }
    }

    /// Drop buffered values and start collecting again.
    pub(crate) fn restart(&mut self) {
        self.phase = Phase::Collecting(Vec::new());
    }

    /// Values currently held.
    pub(crate) fn buffered(&self) -> usize {
        match &self.phase {
            Phase::Collecting(buffer) => buffer.len(),
            Phase::Draining(items) => items.len(),
            Phase::Finished => 0,
        }
    }

    /// Copy including every buffered value.
    pub(crate) fn duplicate(&self) -> Result<Self> {
        let phase = match &self.phase {
            Phase::Collecting(buffer) => Phase::Collecting(
                buffer
                    .iter()
                    .map(self.duplicate)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Phase::Draining(items) => Phase::Draining(
                items
                    .as_slice()
                    .iter()
                    .map(self.duplicate)
                    .collect::<Result<Vec<_>>>()?
                    .into_iter(),
            ),
            Phase::Finished => Phase::Finished,
        };
        Ok(Self {
            phase,
            config: self.config,
            duplicate: self.duplicate,
        })
    }
}

/// Buffer duplicates of everything left in `source`.
fn fill<T>(
    buffer: &mut Vec<T>,
    source: &mut dyn Cursor<T>,
    config: &BufferConfig,
    duplicate: fn(&T) -> Result<T>,
) -> Result<()> {
    while let Some(item) = source.next()? {
        if let Some(limit) = config.max_buffered {
            if buffer.len() >= limit {
                return Err(Error::BufferLimitExceeded { limit });
            }
        }
        if buffer.capacity() == 0 {
            buffer.reserve(config.initial_capacity);
        }
        buffer.push(duplicate(&item)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Duplicate;
    use crate::iterator::Iter;

    fn deferred(config: BufferConfig) -> Deferred<i32> {
        Deferred::new(config, <i32 as Duplicate>::duplicate)
    }

    fn ascending(a: &i32, b: &i32) -> bool {
        a < b
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        assert!(matches!(
            BufferConfig::new().with_max_buffered(0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_sorts_after_draining_source() {
        let data = [3, 1, 2];
        let mut source = Iter::from_slice(&data);
        let mut state = deferred(BufferConfig::new().with_initial_capacity(8));
        let mut cmp = ascending;
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), Some(1));
        assert_eq!(source.index(), 3);
        assert_eq!(state.buffered(), 2);
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), Some(2));
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), Some(3));
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), None);
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), None);
    }

    #[test]
    fn test_limit_exceeded_is_reported() {
        let data = [5, 4, 3];
        let mut source = Iter::from_slice(&data);
        let mut state = deferred(BufferConfig::new().with_max_buffered(2).unwrap());
        let mut cmp = ascending;
        assert!(matches!(
            state.next_sorted(&mut source, &mut cmp),
            Err(Error::BufferLimitExceeded { limit: 2 })
        ));
    }

    #[test]
    fn test_failed_collection_discards_partial_buffer() {
        let data = [5, 4, 3];
        let mut source = Iter::from_slice(&data);
        let mut state = deferred(BufferConfig::new().with_max_buffered(2).unwrap());
        let mut cmp = ascending;
        assert!(state.next_sorted(&mut source, &mut cmp).is_err());
        assert_eq!(state.buffered(), 0);
        assert_eq!(source.index(), 0);
        assert!(matches!(
            state.next_sorted(&mut source, &mut cmp),
            Err(Error::BufferLimitExceeded { limit: 2 })
        ));
    }

    #[test]
    fn test_duplicate_copies_remaining_values() {
        let data = [9, 7, 8];
        let mut source = Iter::from_slice(&data);
        let mut state = deferred(BufferConfig::new());
        let mut cmp = ascending;
        state.next_sorted(&mut source, &mut cmp).unwrap();
        let mut copy = state.duplicate().unwrap();
        assert_eq!(copy.next_sorted(&mut source, &mut cmp).unwrap(), Some(8));
        assert_eq!(state.next_sorted(&mut source, &mut cmp).unwrap(), Some(8));
        state.restart();
        assert_eq!(state.buffered(), 0);
    }
}
