//! Boxed pipelines
//!
//! A chained `Enumerable` has a type that spells out every stage. An
//! `Enumerator` hides that behind `Box<dyn Cursor<R>>`, so pipelines of any
//! shape can be stored in one field, returned from one function, or kept in
//! one collection.

use std::fmt;

use tracing::debug;

use crate::capability::{Cleanup, Duplicate};
use crate::enumerable::Enumerable;
use crate::iterator::{Cursor, Iter};
use crate::Result;

/// Type-erased pipeline producing `R`.
pub struct Enumerator<'a, R> {
    pipeline: Box<dyn Cursor<R> + 'a>,
}

impl<'a, R> Enumerator<'a, R> {
    /// Box `pipeline` as is.
    pub fn new<E: Cursor<R> + 'a>(pipeline: E) -> Self {
        Self {
            pipeline: Box::new(pipeline),
        }
    }

    /// Box an independent duplicate of `pipeline`; the original stays
    /// usable and owned by the caller.
    pub fn boxed<E>(pipeline: &E) -> Result<Self>
    where
        E: Cursor<R> + Duplicate + 'a,
    {
        let copy = Duplicate::duplicate(pipeline)?;
        debug!(
            pipeline = std::any::type_name::<E>(),
            "boxed pipeline duplicate"
        );
        Ok(Self::new(copy))
    }

    /// Iterator view over the boxed pipeline.
    pub fn iterator(&mut self) -> Iter<'_, R> {
        Iter::new(self.pipeline.as_mut())
    }

    /// New stage reading from the boxed pipeline, for further chaining
    /// without giving up the box.
    pub fn unbox(&mut self) -> Enumerable<'_, R, R> {
        Enumerable::from_cursor(self.pipeline.as_mut())
    }

    /// New stage that owns the boxed pipeline.
    pub fn into_enumerable(self) -> Enumerable<'a, R, R> {
        Enumerable::from_owned(Iter::from_boxed(self.pipeline, None))
    }

    /// Release the pipeline and free the box.
    pub fn dispose(mut self) {
        Cursor::dispose(self.pipeline.as_mut());
    }

    /// Collect every value into a vector.
    pub fn to_vec(&mut self) -> Result<Vec<R>> {
        self.iterator().to_vec()
    }

    /// Call `f` with every value.
    pub fn for_each<F: FnMut(R)>(&mut self, f: F) -> Result<()> {
        self.iterator().for_each(f)
    }

    /// Call a fallible `f` with every value, stopping at its first failure.
    pub fn try_for_each<F: FnMut(R) -> Result<()>>(&mut self, f: F) -> Result<()> {
        self.iterator().try_for_each(f)
    }

    /// First value, if any.
    pub fn first(&mut self) -> Result<Option<R>> {
        self.iterator().first()
    }

    /// Last value, if any.
    pub fn last(&mut self) -> Result<Option<R>> {
        self.iterator().last()
    }

    /// Number of values.
    pub fn count(&mut self) -> Result<usize> {
        self.iterator().count()
    }

    /// First value equal to `needle`.
    pub fn find_eql(&mut self, needle: &R) -> Result<Option<R>>
    where
        R: PartialEq,
    {
        self.iterator().find_eql(needle)
    }

    /// Position of the first value equal to `needle`.
    pub fn find_index_eql(&mut self, needle: &R) -> Result<Option<usize>>
    where
        R: PartialEq,
    {
        self.iterator().find_index_eql(needle)
    }

    /// Dispose every value in place.
    pub fn deinit_all(&mut self) -> Result<()>
    where
        R: Cleanup,
    {
        self.iterator().deinit_all()
    }
}

impl<'a, V: Cleanup> Enumerator<'a, Box<V>> {
    /// Dispose every boxed value, then free its box.
    pub fn destroy_all(&mut self) -> Result<()> {
        self.iterator().destroy_all()
    }
}

impl<'a, R: 'a> Cursor<R> for Enumerator<'a, R> {
    fn next(&mut self) -> Result<Option<R>> {
        self.pipeline.next()
    }

    fn reset(&mut self) {
        self.pipeline.reset()
    }

    fn index(&self) -> usize {
        self.pipeline.index()
    }

    fn dispose(&mut self) {
        Cursor::dispose(self.pipeline.as_mut())
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<R> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(Duplicate::duplicate(self)?))
    }
}

impl<'a, R: 'a> Duplicate for Enumerator<'a, R> {
    fn duplicate(&self) -> Result<Self> {
        Ok(Self {
            pipeline: Cursor::duplicate(&*self.pipeline)?,
        })
    }
}

impl<R> fmt::Debug for Enumerator<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("index", &self.pipeline.index())
            .finish_non_exhaustive()
    }
}
