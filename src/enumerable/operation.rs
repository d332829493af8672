//! Stage operations and the function contracts they call
//!
//! Each stage carries exactly one `Operation`, inspected once per pull.
//! Stage functions sit behind small traits so a pipeline can duplicate them:
//! ordinary closures duplicate through `Clone`, [`crate::Closure`] through
//! its state's `Duplicate`.

use std::fmt;

use crate::capability::{Closure, Duplicate};
use crate::Result;

/// Map stage function: `(value, upstream index) -> result`.
pub trait Mapper<T, R> {
    /// Transform one value.
    fn apply(&mut self, item: T, index: usize) -> Result<R>;

    /// Independent copy of this function and its captured state.
    fn duplicate<'s>(&self) -> Result<Box<dyn Mapper<T, R> + 's>>
    where
        Self: 's;
}

impl<T, R, F> Mapper<T, R> for F
where
    F: FnMut(T, usize) -> Result<R> + Clone,
{
    fn apply(&mut self, item: T, index: usize) -> Result<R> {
        (self)(item, index)
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Mapper<T, R> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(self.clone()))
    }
}

// Used as a map stage, duplication goes through the state rather than Clone.
impl<S: Duplicate, A, R> Mapper<A, R> for Closure<S, A, R> {
    fn apply(&mut self, item: A, _index: usize) -> Result<R> {
        Ok(self.invoke(item))
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Mapper<A, R> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(Duplicate::duplicate(self)?))
    }
}

/// Filter stage function.
pub trait Predicate<T> {
    /// Whether `item` passes.
    fn test(&mut self, item: &T) -> Result<bool>;

    /// Independent copy of this function and its captured state.
    fn duplicate<'s>(&self) -> Result<Box<dyn Predicate<T> + 's>>
    where
        Self: 's;
}

impl<T, F> Predicate<T> for F
where
    F: FnMut(&T) -> Result<bool> + Clone,
{
    fn test(&mut self, item: &T) -> Result<bool> {
        (self)(item)
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Predicate<T> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(self.clone()))
    }
}

/// OrderBy comparator: a strict less-than relation.
pub trait Comparator<T> {
    /// Whether `a` sorts before `b`.
    fn less_than(&mut self, a: &T, b: &T) -> bool;

    /// Independent copy of this function and its captured state.
    fn duplicate<'s>(&self) -> Result<Box<dyn Comparator<T> + 's>>
    where
        Self: 's;
}

impl<T, F> Comparator<T> for F
where
    F: FnMut(&T, &T) -> bool + Clone,
{
    fn less_than(&mut self, a: &T, b: &T) -> bool {
        (self)(a, b)
    }

    fn duplicate<'s>(&self) -> Result<Box<dyn Comparator<T> + 's>>
    where
        Self: 's,
    {
        Ok(Box::new(self.clone()))
    }
}

/// Operation performed by one pipeline stage.
///
/// `pass` fields only exist on operations whose output type equals their
/// input type; they are always `std::convert::identity`.
pub enum Operation<'a, T, R> {
    /// Passthrough; the base of freshly wrapped sources
    Identity {
        /// Identity conversion `T -> R`
        pass: fn(T) -> R,
    },

    /// Transform each value
    Map {
        /// Mapping function
        function: Box<dyn Mapper<T, R> + 'a>,
        /// Whether the function was given as `(value, index)`
        has_index: bool,
    },

    /// Keep values passing a predicate
    Filter {
        /// Predicate
        predicate: Box<dyn Predicate<T> + 'a>,
        /// Whether the predicate was given in fallible form
        has_error: bool,
        /// Identity conversion `T -> R`
        pass: fn(T) -> R,
    },

    /// Buffer everything, sort, then drain
    OrderBy {
        /// Strict less-than
        comparator: Box<dyn Comparator<T> + 'a>,
        /// Identity conversion `T -> R`
        pass: fn(T) -> R,
    },
}

impl<'a, T> Operation<'a, T, T> {
    pub(crate) fn identity() -> Self {
        Operation::Identity {
            pass: std::convert::identity,
        }
    }

    pub(crate) fn filter(predicate: Box<dyn Predicate<T> + 'a>, has_error: bool) -> Self {
        Operation::Filter {
            predicate,
            has_error,
            pass: std::convert::identity,
        }
    }

    pub(crate) fn order_by(comparator: Box<dyn Comparator<T> + 'a>) -> Self {
        Operation::OrderBy {
            comparator,
            pass: std::convert::identity,
        }
    }
}

impl<'a, T, R> Operation<'a, T, R> {
    /// Short name of the operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Identity { .. } => "identity",
            Operation::Map { .. } => "map",
            Operation::Filter { .. } => "filter",
            Operation::OrderBy { .. } => "order_by",
        }
    }
}

impl<'a, T: 'a, R: 'a> Duplicate for Operation<'a, T, R> {
    fn duplicate(&self) -> Result<Self> {
        Ok(match self {
            Operation::Identity { pass } => Operation::Identity { pass: *pass },
            Operation::Map {
                function,
                has_index,
            } => Operation::Map {
                function: Mapper::duplicate(&**function)?,
                has_index: *has_index,
            },
            Operation::Filter {
                predicate,
                has_error,
                pass,
            } => Operation::Filter {
                predicate: Predicate::duplicate(&**predicate)?,
                has_error: *has_error,
                pass: *pass,
            },
            Operation::OrderBy { comparator, pass } => Operation::OrderBy {
                comparator: Comparator::duplicate(&**comparator)?,
                pass: *pass,
            },
        })
    }
}

impl<T, R> fmt::Debug for Operation<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Identity { .. } => f.write_str("Identity"),
            Operation::Map { has_index, .. } => f
                .debug_struct("Map")
                .field("has_index", has_index)
                .finish_non_exhaustive(),
            Operation::Filter { has_error, .. } => f
                .debug_struct("Filter")
                .field("has_error", has_error)
                .finish_non_exhaustive(),
            Operation::OrderBy { .. } => f.debug_struct("OrderBy").finish_non_exhaustive(),
        }
    }
}
