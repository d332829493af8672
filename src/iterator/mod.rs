//! Pull-based cursor abstraction
//!
//! `Cursor` is the operation table (next / reset / index / dispose /
//! duplicate); `Iter` is the type-erased handle callers hold. Every stage of
//! an `Enumerable` is itself a `Cursor`, which is what lets stages nest.

mod sources;

pub use sources::Stepper;

use std::fmt;

use tracing::debug;

use crate::capability::{Cleanup, Duplicate};
use crate::{Error, Result};

/// Operations backing an iterator.
///
/// `next` yields `Ok(Some(value))`, `Ok(None)` at end-of-sequence, or the
/// first failure. Once `Ok(None)` is returned, further calls keep returning
/// it until `reset`.
pub trait Cursor<T> {
    /// Produce the next value.
    fn next(&mut self) -> Result<Option<T>>;

    /// Rewind to the start. Must be safe before the first `next`.
    fn reset(&mut self);

    /// Position of the value the next call to `next` will produce.
    fn index(&self) -> usize {
        0
    }

    /// Release resources held for traversal.
    fn dispose(&mut self) {}

    /// Independent copy of this cursor, at the same position.
    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<T> + 's>>
    where
        Self: 's,
    {
        Err(Error::duplication_unsupported::<Self>())
    }
}

impl<T, C: Cursor<T> + ?Sized> Cursor<T> for &mut C {
    fn next(&mut self) -> Result<Option<T>> {
        (**self).next()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn index(&self) -> usize {
        (**self).index()
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<T> + 's>>
    where
        Self: 's,
    {
        Cursor::duplicate(&**self)
    }
}

/// Type-erased iterator handle.
///
/// Dropping the handle releases it; `dispose` does the same explicitly.
/// Finalizers consume the handle, so it is released exactly once on every
/// exit path, including failures.
pub struct Iter<'a, T> {
    cursor: Box<dyn Cursor<T> + 'a>,
    /// Known length, for handles over fixed sequences
    len: Option<usize>,
    /// End-of-sequence seen since the last reset
    exhausted: bool,
    released: bool,
}

impl<'a, T> Iter<'a, T> {
    /// Wrap any cursor implementation.
    pub fn new<C: Cursor<T> + 'a>(cursor: C) -> Self {
        Self::from_boxed(Box::new(cursor), None)
    }

    pub(crate) fn from_boxed(cursor: Box<dyn Cursor<T> + 'a>, len: Option<usize>) -> Self {
        Self {
            cursor,
            len,
            exhausted: false,
            released: false,
        }
    }

    /// Produce the next value. After the first `Ok(None)` the handle keeps
    /// reporting end-of-sequence until `reset`, whatever the cursor does.
    pub fn next(&mut self) -> Result<Option<T>> {
        if self.released || self.exhausted {
            return Ok(None);
        }
        let item = self.cursor.next()?;
        self.exhausted = item.is_none();
        Ok(item)
    }

    /// Rewind to the first value.
    pub fn reset(&mut self) {
        if !self.released {
            self.cursor.reset();
            self.exhausted = false;
        }
    }

    /// Position of the value the next call to `next` will produce.
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    /// Length of the underlying sequence, when it is fixed.
    pub fn known_len(&self) -> Option<usize> {
        self.len
    }

    /// Release the handle now.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.cursor.dispose();
        }
    }

    fn pull(&mut self, finalizer: &'static str) -> Result<Option<T>> {
        self.next()
            .inspect_err(|err| debug!(finalizer, error = %err, "finalizer stopped on error"))
    }

    /// Collect every value into a vector.
    pub fn to_vec(mut self) -> Result<Vec<T>> {
        self.reset();
        let mut items = Vec::with_capacity(self.len.unwrap_or(0));
        while let Some(item) = self.pull("to_vec")? {
            items.push(item);
        }
        Ok(items)
    }

    /// Call `f` with every value.
    pub fn for_each<F: FnMut(T)>(mut self, mut f: F) -> Result<()> {
        self.reset();
        while let Some(item) = self.pull("for_each")? {
            f(item);
        }
        Ok(())
    }

    /// Call a fallible `f` with every value, stopping at its first failure.
    pub fn try_for_each<F: FnMut(T) -> Result<()>>(mut self, mut f: F) -> Result<()> {
        self.reset();
        while let Some(item) = self.pull("try_for_each")? {
            f(item).inspect_err(|err| {
                debug!(finalizer = "try_for_each", error = %err, "callback failed")
            })?;
        }
        Ok(())
    }

    /// First value, if any.
    pub fn first(mut self) -> Result<Option<T>> {
        self.reset();
        self.pull("first")
    }

    /// Last value, if any.
    pub fn last(mut self) -> Result<Option<T>> {
        self.reset();
        let mut last = None;
        while let Some(item) = self.pull("last")? {
            last = Some(item);
        }
        Ok(last)
    }

    /// Number of values.
    pub fn count(mut self) -> Result<usize> {
        self.reset();
        let mut count = 0;
        while self.pull("count")?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Dispose every value in place.
    pub fn deinit_all(mut self) -> Result<()>
    where
        T: Cleanup,
    {
        self.reset();
        while let Some(mut item) = self.pull("deinit_all")? {
            item.dispose();
        }
        Ok(())
    }
}

impl<'a, T: PartialEq> Iter<'a, T> {
    /// First value equal to `needle`.
    pub fn find_eql(mut self, needle: &T) -> Result<Option<T>> {
        self.reset();
        while let Some(item) = self.pull("find_eql")? {
            if item == *needle {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    /// Position of the first value equal to `needle`.
    pub fn find_index_eql(mut self, needle: &T) -> Result<Option<usize>> {
        self.reset();
        let mut position = 0;
        while let Some(item) = self.pull("find_index_eql")? {
            if item == *needle {
                return Ok(Some(position));
            }
            position += 1;
        }
        Ok(None)
    }
}

impl<'a, U: Cleanup> Iter<'a, Box<U>> {
    /// Dispose every boxed value, then free its box.
    pub fn destroy_all(mut self) -> Result<()> {
        self.reset();
        while let Some(mut boxed) = self.pull("destroy_all")? {
            boxed.dispose();
            drop(boxed);
        }
        Ok(())
    }
}

impl<T> Drop for Iter<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<'a, T: 'a> Cursor<T> for Iter<'a, T> {
    fn next(&mut self) -> Result<Option<T>> {
        Iter::next(self)
    }

    fn reset(&mut self) {
        Iter::reset(self)
    }

    fn index(&self) -> usize {
        Iter::index(self)
    }

    fn dispose(&mut self) {
        self.release();
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<T> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(Duplicate::duplicate(self)?))
    }
}

impl<'a, T: 'a> Duplicate for Iter<'a, T> {
    fn duplicate(&self) -> Result<Self> {
        let mut copy = Self::from_boxed(Cursor::duplicate(&*self.cursor)?, self.len);
        copy.exhausted = self.exhausted;
        Ok(copy)
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("index", &self.index())
            .field("len", &self.len)
            .field("exhausted", &self.exhausted)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
