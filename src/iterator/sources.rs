//! Iterator sources: borrowed slices, owned vectors, std iterators and
//! foreign stepping objects.

use tracing::debug;

use super::{Cursor, Iter};
use crate::capability::Duplicate;
use crate::Result;

/// Adapter contract for externally defined stepping objects.
///
/// Only `step` is required; override the others when the foreign type can
/// rewind, report its position, or owns something to release.
pub trait Stepper {
    /// Value type produced by `step`.
    type Item;

    /// Advance, returning `None` at the end.
    fn step(&mut self) -> Option<Self::Item>;

    /// Return to the first value.
    fn rewind(&mut self) {}

    /// Position of the value the next `step` will produce.
    fn position(&self) -> Option<usize> {
        None
    }

    /// Release owned resources.
    fn release(&mut self) {}
}

impl<S: Stepper + ?Sized> Stepper for &mut S {
    type Item = S::Item;

    fn step(&mut self) -> Option<Self::Item> {
        (**self).step()
    }

    fn rewind(&mut self) {
        (**self).rewind()
    }

    fn position(&self) -> Option<usize> {
        (**self).position()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<'a, T: Clone + 'a> Iter<'a, T> {
    /// Iterate a borrowed slice, yielding clones in order.
    pub fn from_slice(items: &'a [T]) -> Self {
        Self::from_boxed(Box::new(SliceCursor { items, idx: 0 }), Some(items.len()))
    }
}

impl<'a, T: 'a> Iter<'a, &'a T> {
    /// Iterate a borrowed slice by shared reference.
    pub fn from_refs(items: &'a [T]) -> Self {
        Self::from_std(items.iter())
    }
}

impl<'a, T: 'a> Iter<'a, &'a mut T> {
    /// Iterate a mutable slice, yielding a mutable reference to each element.
    ///
    /// Single pass: once a reference has been handed out it cannot be handed
    /// out again, so `reset` does not rewind.
    pub fn from_slice_mut(items: &'a mut [T]) -> Self {
        let len = items.len();
        Self::from_boxed(Box::new(SliceMutCursor { rest: items, idx: 0 }), Some(len))
    }
}

impl<'a, T: Duplicate + 'a> Iter<'a, T> {
    /// Take ownership of a vector; yields deep duplicates of its elements.
    pub fn from_vec(items: Vec<T>) -> Self {
        let len = items.len();
        Self::from_boxed(Box::new(VecCursor { items, idx: 0 }), Some(len))
    }
}

impl<'a, T> Iter<'a, T> {
    /// Adapt a cloneable std iterator; a pristine clone backs `reset`.
    pub fn from_std<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + Clone + 'a,
    {
        let len = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        };
        Self::from_boxed(
            Box::new(StdCursor {
                origin: iter.clone(),
                live: iter,
                idx: 0,
            }),
            len,
        )
    }

    /// Adapt a foreign stepping object.
    pub fn from_foreign<S>(stepper: S) -> Self
    where
        S: Stepper<Item = T> + 'a,
    {
        Self::from_boxed(Box::new(ForeignCursor(stepper)), None)
    }
}

struct SliceCursor<'a, T> {
    items: &'a [T],
    idx: usize,
}

impl<'a, T: Clone> Cursor<T> for SliceCursor<'a, T> {
    fn next(&mut self) -> Result<Option<T>> {
        let item = self.items.get(self.idx).cloned();
        if item.is_some() {
            self.idx += 1;
        }
        Ok(item)
    }

    fn reset(&mut self) {
        self.idx = 0;
    }

    fn index(&self) -> usize {
        self.idx
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<T> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(SliceCursor {
            items: self.items,
            idx: self.idx,
        }))
    }
}

struct SliceMutCursor<'a, T> {
    rest: &'a mut [T],
    idx: usize,
}

impl<'a, T> Cursor<&'a mut T> for SliceMutCursor<'a, T> {
    fn next(&mut self) -> Result<Option<&'a mut T>> {
        let rest = std::mem::take(&mut self.rest);
        match rest.split_first_mut() {
            Some((first, tail)) => {
                self.rest = tail;
                self.idx += 1;
                Ok(Some(first))
            }
            None => Ok(None),
        }
    }

    // Handed-out references stay live; there is nothing safe to rewind to.
    fn reset(&mut self) {
        if self.idx > 0 {
            debug!(
                handed_out = self.idx,
                "mutable slice cannot rewind, continuing from current position"
            );
        }
    }

    fn index(&self) -> usize {
        self.idx
    }
}

struct VecCursor<T> {
    items: Vec<T>,
    idx: usize,
}

impl<T: Duplicate> Cursor<T> for VecCursor<T> {
    fn next(&mut self) -> Result<Option<T>> {
        match self.items.get(self.idx) {
            Some(item) => {
                let copy = item.duplicate()?;
                self.idx += 1;
                Ok(Some(copy))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.idx = 0;
    }

    fn index(&self) -> usize {
        self.idx
    }

    fn dispose(&mut self) {
        self.items = Vec::new();
        self.idx = 0;
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<T> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(VecCursor {
            items: self.items.duplicate()?,
            idx: self.idx,
        }))
    }
}

struct StdCursor<I> {
    origin: I,
    live: I,
    idx: usize,
}

impl<I: Iterator + Clone> Cursor<I::Item> for StdCursor<I> {
    fn next(&mut self) -> Result<Option<I::Item>> {
        let item = self.live.next();
        if item.is_some() {
            self.idx += 1;
        }
        Ok(item)
    }

    fn reset(&mut self) {
        self.live = self.origin.clone();
        self.idx = 0;
    }

    fn index(&self) -> usize {
        self.idx
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<I::Item> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(StdCursor {
            origin: self.origin.clone(),
            live: self.live.clone(),
            idx: self.idx,
        }))
    }
}

struct ForeignCursor<S>(S);

impl<S: Stepper> Cursor<S::Item> for ForeignCursor<S> {
    fn next(&mut self) -> Result<Option<S::Item>> {
        Ok(self.0.step())
    }

    fn reset(&mut self) {
        self.0.rewind();
    }

    fn index(&self) -> usize {
        self.0.position().unwrap_or(0)
    }

    fn dispose(&mut self) {
        self.0.release();
    }
}
