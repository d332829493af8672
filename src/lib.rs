//! # Lazy Pull Pipelines over Borrowed and Owned Sequences
//!
//! This library provides generic infrastructure for composing lazily
//! evaluated query pipelines, together with the small capability contracts
//! those pipelines lean on.
//!
//! ## Layers
//!
//! 1. **Capabilities**: explicit cleanup, fallible deep duplication,
//!    type-erased boxes and closures with captured state
//! 2. **Iterator**: a pull-based, resettable, type-erased cursor (`Iter`)
//! 3. **Enumerable**: a chain of Map / Filter / OrderBy stages, each stage
//!    itself usable as a cursor
//! 4. **Enumerator**: a boxed pipeline whose type no longer records its depth
//!
//! ## Usage Example
//!
//! ```
//! use lazypipe::Enumerable;
//!
//! let numbers = [5, 4, 2, 3, 1, 6];
//! let mut evens = Enumerable::from_slice(&numbers)
//!     .order_by(|a: &i32, b: &i32| a < b)
//!     .filter(|x: &i32| x % 2 == 0);
//!
//! assert_eq!(evens.to_vec().unwrap(), vec![2, 4, 6]);
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules, leaves first
pub mod capability; // Cleanup, duplication, closures, type-erased boxes
pub mod iterator; // Pull-based cursor abstraction
pub mod enumerable; // Lazy transformation stages
pub mod enumerator; // Boxed pipelines

// Re-exports for convenience
pub use capability::{AnyBox, Cleanup, Closure, Duplicate};
pub use enumerable::{BufferConfig, Comparator, Detached, Enumerable, Mapper, Operation, Predicate};
pub use enumerator::Enumerator;
pub use iterator::{Cursor, Iter, Stepper};

use thiserror::Error;

/// Boxed error produced by user-supplied stage functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by pipelines and capabilities
#[derive(Error, Debug)]
pub enum Error {
    /// A type opted out of deep duplication
    #[error("duplication unsupported for type {type_name}")]
    DuplicationUnsupported {
        /// Name of the type that refused to be duplicated
        type_name: &'static str,
    },

    /// A type-erased value was accessed as the wrong type
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type requested by the caller
        expected: &'static str,
        /// Type actually stored
        found: &'static str,
    },

    /// A Map or Filter function reported a failure
    #[error("stage function failed: {0}")]
    Function(#[source] BoxError),

    /// An OrderBy stage was asked to buffer more elements than allowed
    #[error("order-by buffer limit of {limit} elements exceeded")]
    BufferLimitExceeded {
        /// Configured maximum number of buffered elements
        limit: usize,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl Error {
    /// Helper for constructing failures raised by stage functions.
    pub fn function(err: impl Into<BoxError>) -> Self {
        Error::Function(err.into())
    }

    /// Helper for types that refuse deep duplication.
    pub fn duplication_unsupported<T: ?Sized>() -> Self {
        Error::DuplicationUnsupported {
            type_name: std::any::type_name::<T>(),
        }
    }
}
