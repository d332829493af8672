//! Composable pipeline stages
//!
//! An `Enumerable` is one stage: an upstream cursor plus a single
//! [`Operation`]. Chaining a stage consumes it and nests it inline in the
//! next one, so a whole pipeline is one value whose type records its shape:
//!
//! ```text
//! Enumerable<i32, i32, Enumerable<i32, i32, Enumerable<i32, i32>>>
//!      map             filter                  order_by (base)
//! ```
//!
//! Nothing runs until a finalizer or a consumer pulls from the outermost
//! stage. Pulls travel upstream one value at a time, except through an
//! OrderBy stage, which drains everything below it before yielding.

mod deferred;
mod operation;

pub use deferred::BufferConfig;
pub use operation::{Comparator, Mapper, Operation, Predicate};

use std::fmt;

use tracing::trace;

use crate::capability::{Cleanup, Duplicate};
use crate::enumerator::Enumerator;
use crate::iterator::{Cursor, Iter, Stepper};
use crate::Result;
use deferred::Deferred;

/// Placeholder upstream for stages that wrap a plain iterator.
///
/// It has no values, so an inline upstream of this type never exists.
#[derive(Debug)]
pub enum Detached {}

impl<T> Cursor<T> for Detached {
    fn next(&mut self) -> Result<Option<T>> {
        match *self {}
    }

    fn reset(&mut self) {
        match *self {}
    }
}

impl Duplicate for Detached {
    fn duplicate(&self) -> Result<Self> {
        match *self {}
    }
}

enum Upstream<'a, T, P> {
    /// Previous stage, owned by value
    Inline(P),
    /// Externally owned cursor; reset but never released here
    Borrowed(&'a mut (dyn Cursor<T> + 'a)),
    /// Iterator owned by this stage
    Owned(Iter<'a, T>),
}

impl<'a, T: 'a, P: Cursor<T>> Upstream<'a, T, P> {
    fn cursor(&mut self) -> &mut dyn Cursor<T> {
        match self {
            Upstream::Inline(stage) => stage,
            Upstream::Borrowed(cursor) => &mut **cursor,
            Upstream::Owned(iter) => iter,
        }
    }
}

impl<T, P> Upstream<'_, T, P> {
    fn kind(&self) -> &'static str {
        match self {
            Upstream::Inline(_) => "inline",
            Upstream::Borrowed(_) => "borrowed",
            Upstream::Owned(_) => "owned",
        }
    }
}

/// One lazy pipeline stage, consuming `T` and producing `R`.
pub struct Enumerable<'a, T, R, P = Detached> {
    upstream: Upstream<'a, T, P>,
    operation: Operation<'a, T, R>,
    /// Present exactly when `operation` is OrderBy
    deferred: Option<Deferred<T>>,
    produced: usize,
    /// End-of-sequence seen since the last reset
    exhausted: bool,
}

impl<'a, T> Enumerable<'a, T, T> {
    fn wrap(upstream: Upstream<'a, T, Detached>) -> Self {
        Self {
            upstream,
            operation: Operation::identity(),
            deferred: None,
            produced: 0,
            exhausted: false,
        }
    }

    /// Wrap an iterator this stage takes ownership of.
    pub fn from_owned(iter: Iter<'a, T>) -> Self {
        Self::wrap(Upstream::Owned(iter))
    }

    /// Wrap an externally owned iterator (or any cursor, including another
    /// stage). The caller keeps ownership; this stage resets it but never
    /// releases it.
    pub fn from_iterator<C: Cursor<T>>(iter: &'a mut C) -> Self {
        Self::wrap(Upstream::Borrowed(iter))
    }

    /// Wrap an externally owned, type-erased cursor.
    pub fn from_cursor(cursor: &'a mut (dyn Cursor<T> + 'a)) -> Self {
        Self::wrap(Upstream::Borrowed(cursor))
    }

    /// Stage over a borrowed slice.
    pub fn from_slice(items: &'a [T]) -> Self
    where
        T: Clone,
    {
        Self::from_owned(Iter::from_slice(items))
    }

    /// Stage owning a vector.
    pub fn from_vec(items: Vec<T>) -> Self
    where
        T: Duplicate + 'a,
    {
        Self::from_owned(Iter::from_vec(items))
    }

    /// Stage over a cloneable std iterator.
    pub fn from_std<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + Clone + 'a,
    {
        Self::from_owned(Iter::from_std(iter))
    }

    /// Stage over a foreign stepping object.
    pub fn from_foreign<S>(stepper: S) -> Self
    where
        S: Stepper<Item = T> + 'a,
    {
        Self::from_owned(Iter::from_foreign(stepper))
    }
}

impl<'a, T: 'a, R: 'a, P> Enumerable<'a, T, R, P>
where
    P: Cursor<T> + Duplicate,
{
    fn chain<U>(
        self,
        operation: Operation<'a, R, U>,
        deferred: Option<Deferred<R>>,
    ) -> Enumerable<'a, R, U, Self> {
        trace!(
            upstream = self.operation.kind(),
            operation = operation.kind(),
            "chaining stage"
        );
        Enumerable {
            upstream: Upstream::Inline(self),
            operation,
            deferred,
            produced: 0,
            exhausted: false,
        }
    }

    /// Transform each value.
    pub fn map<U, F>(self, mut f: F) -> Enumerable<'a, R, U, Self>
    where
        F: FnMut(R) -> U + Clone + 'a,
    {
        let function = move |item: R, _index: usize| -> Result<U> { Ok(f(item)) };
        self.chain(
            Operation::Map {
                function: Box::new(function),
                has_index: false,
            },
            None,
        )
    }

    /// Transform each value, also passing the upstream position it came from.
    pub fn map_with_index<U, F>(self, mut f: F) -> Enumerable<'a, R, U, Self>
    where
        F: FnMut(R, usize) -> U + Clone + 'a,
    {
        let function = move |item: R, index: usize| -> Result<U> { Ok(f(item, index)) };
        self.chain(
            Operation::Map {
                function: Box::new(function),
                has_index: true,
            },
            None,
        )
    }

    /// Transform each value with a fallible function.
    pub fn try_map<U, F>(self, mut f: F) -> Enumerable<'a, R, U, Self>
    where
        F: FnMut(R) -> Result<U> + Clone + 'a,
    {
        let function = move |item: R, _index: usize| -> Result<U> { f(item) };
        self.chain(
            Operation::Map {
                function: Box::new(function),
                has_index: false,
            },
            None,
        )
    }

    /// Transform each value with an explicit [`Mapper`], such as a
    /// [`crate::Closure`] with owned state.
    pub fn map_with<U, M>(self, mapper: M) -> Enumerable<'a, R, U, Self>
    where
        M: Mapper<R, U> + 'a,
    {
        self.chain(
            Operation::Map {
                function: Box::new(mapper),
                has_index: false,
            },
            None,
        )
    }

    /// Keep values for which `f` returns true.
    pub fn filter<F>(self, mut f: F) -> Enumerable<'a, R, R, Self>
    where
        F: FnMut(&R) -> bool + Clone + 'a,
    {
        let predicate = move |item: &R| -> Result<bool> { Ok(f(item)) };
        self.chain(Operation::filter(Box::new(predicate), false), None)
    }

    /// Keep values for which a fallible `f` returns true; its failures
    /// propagate.
    pub fn filter_by<F>(self, f: F) -> Enumerable<'a, R, R, Self>
    where
        F: FnMut(&R) -> Result<bool> + Clone + 'a,
    {
        self.chain(Operation::filter(Box::new(f), true), None)
    }

    /// Sort all values by a strict less-than. The stage buffers its entire
    /// upstream on the first pull; buffered values are duplicates.
    pub fn order_by<F>(self, less_than: F) -> Enumerable<'a, R, R, Self>
    where
        R: Duplicate,
        F: FnMut(&R, &R) -> bool + Clone + 'a,
    {
        self.order_by_with(BufferConfig::default(), less_than)
    }

    /// [`Self::order_by`] with explicit buffering limits.
    pub fn order_by_with<F>(self, config: BufferConfig, less_than: F) -> Enumerable<'a, R, R, Self>
    where
        R: Duplicate,
        F: FnMut(&R, &R) -> bool + Clone + 'a,
    {
        let deferred = Deferred::new(config, <R as Duplicate>::duplicate);
        self.chain(Operation::order_by(Box::new(less_than)), Some(deferred))
    }

    /// Iterator view over this stage. Finalizers called on the view reset
    /// the whole pipeline first. Dropping the view leaves the stage where
    /// the view stopped, including a partly drained OrderBy buffer.
    pub fn iterator(&mut self) -> Iter<'_, R> {
        Iter::new(self)
    }

    /// Operation this stage performs.
    pub fn operation(&self) -> &Operation<'a, T, R> {
        &self.operation
    }

    /// Independent copy of the whole pipeline. A borrowed upstream is
    /// duplicated into an owned one.
    pub fn dupe(&self) -> Result<Self> {
        Duplicate::duplicate(self)
    }

    /// Box a duplicate of this pipeline behind a uniform type.
    pub fn enumerator(&self) -> Result<Enumerator<'a, R>>
    where
        Self: 'a,
    {
        Enumerator::boxed(self)
    }

    /// Box this pipeline behind a uniform type without copying it.
    pub fn into_enumerator(self) -> Enumerator<'a, R>
    where
        Self: 'a,
    {
        Enumerator::new(self)
    }

    /// Release the pipeline: buffered values, then an owned upstream
    /// iterator or the previous stage. A borrowed upstream is left alone.
    pub fn dispose(self) {
        let Self {
            upstream, deferred, ..
        } = self;
        drop(deferred);
        match upstream {
            Upstream::Inline(stage) => drop(stage),
            Upstream::Owned(iter) => iter.dispose(),
            Upstream::Borrowed(_) => {}
        }
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

impl<'a, T: 'a, V: 'a, P> Enumerable<'a, T, Box<V>, P>
where
    V: Cleanup,
    P: Cursor<T> + Duplicate,
{
    /// Dispose every boxed value, then free its box.
    pub fn destroy_all(&mut self) -> Result<()> {
        self.iterator().destroy_all()
    }
}

/// Pull the next value through a streaming (non-buffering) operation.
fn stream<T, R>(source: &mut dyn Cursor<T>, operation: &mut Operation<'_, T, R>) -> Result<Option<R>> {
    loop {
        let index = source.index();
        let Some(item) = source.next()? else {
            return Ok(None);
        };
        match operation {
            Operation::Identity { pass } => return Ok(Some((*pass)(item))),
            Operation::Map {
                function,
                has_index,
            } => {
                let index = if *has_index { index } else { 0 };
                return function.apply(item, index).map(Some);
            }
            Operation::Filter {
                predicate, pass, ..
            } => {
                if predicate.test(&item)? {
                    return Ok(Some((*pass)(item)));
                }
            }
            Operation::OrderBy { .. } => {
                unreachable!("order_by stages pull through their deferred buffer")
            }
        }
    }
}

impl<'a, T: 'a, R: 'a, P> Cursor<R> for Enumerable<'a, T, R, P>
where
    P: Cursor<T> + Duplicate,
{
    fn next(&mut self) -> Result<Option<R>> {
        if self.exhausted {
            return Ok(None);
        }
        let produced = match &mut self.operation {
            Operation::OrderBy { comparator, pass } => {
                let Some(deferred) = self.deferred.as_mut() else {
                    unreachable!("order_by stage without a buffer")
                };
                deferred
                    .next_sorted(self.upstream.cursor(), &mut **comparator)?
                    .map(*pass)
            }
            operation => stream(self.upstream.cursor(), operation)?,
        };
        match produced {
            Some(_) => self.produced += 1,
            None => self.exhausted = true,
        }
        Ok(produced)
    }

    fn reset(&mut self) {
        self.upstream.cursor().reset();
        if let Some(deferred) = self.deferred.as_mut() {
            deferred.restart();
        }
        self.produced = 0;
        self.exhausted = false;
    }

    fn index(&self) -> usize {
        self.produced
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Cursor<R> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(Duplicate::duplicate(self)?))
    }
}

impl<'a, T: 'a, R: 'a, P> Duplicate for Enumerable<'a, T, R, P>
where
    P: Cursor<T> + Duplicate,
{
    fn duplicate(&self) -> Result<Self> {
        let upstream = match &self.upstream {
            Upstream::Inline(stage) => Upstream::Inline(Duplicate::duplicate(stage)?),
            Upstream::Borrowed(cursor) => {
                Upstream::Owned(Iter::from_boxed(Cursor::duplicate(&**cursor)?, None))
            }
            Upstream::Owned(iter) => Upstream::Owned(Duplicate::duplicate(iter)?),
        };
        let deferred = self
            .deferred
            .as_ref()
            .map(Deferred::duplicate)
            .transpose()?;
        Ok(Self {
            upstream,
            operation: Duplicate::duplicate(&self.operation)?,
            deferred,
            produced: self.produced,
            exhausted: self.exhausted,
        })
    }
}

impl<T, R, P> fmt::Debug for Enumerable<'_, T, R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerable")
            .field("upstream", &self.upstream.kind())
            .field("operation", &self.operation)
            .field("buffered", &self.deferred.as_ref().map(Deferred::buffered))
            .field("produced", &self.produced)
            .finish()
    }
}
