//! Closures with explicitly owned captured state
//!
//! Unlike a Rust closure literal, the captured state is a named value, so it
//! can be deep-duplicated, disposed and compared.

use std::fmt;

use super::{Cleanup, Duplicate};
use crate::Result;

/// Function pointer plus the state it was closed over.
pub struct Closure<S, A, R> {
    state: S,
    function: fn(&mut S, A) -> R,
}

impl<S, A, R> Closure<S, A, R> {
    /// Bundle `function` with its captured `state`.
    pub fn new(state: S, function: fn(&mut S, A) -> R) -> Self {
        Self { state, function }
    }

    /// Call the function with the captured state.
    pub fn invoke(&mut self, args: A) -> R {
        (self.function)(&mut self.state, args)
    }

    /// Captured state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Consume the closure, returning its state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Identity check: both closures run the same function.
    pub fn same_function(&self, other: &Self) -> bool {
        self.function as usize == other.function as usize
    }
}

impl<S: Cleanup, A, R> Cleanup for Closure<S, A, R> {
    fn dispose(&mut self) {
        self.state.dispose();
    }
}

impl<S: Duplicate, A, R> Duplicate for Closure<S, A, R> {
    fn duplicate(&self) -> Result<Self> {
        Ok(Self {
            state: self.state.duplicate()?,
            function: self.function,
        })
    }
}

impl<S: PartialEq, A, R> PartialEq for Closure<S, A, R> {
    fn eq(&self, other: &Self) -> bool {
        self.same_function(other) && self.state == other.state
    }
}

impl<S: fmt::Debug, A, R> fmt::Debug for Closure<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("state", &self.state)
            .field("function", &(self.function as usize as *const ()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(total: &mut i64, value: i64) -> i64 {
        *total += value;
        *total
    }

    fn scale(factor: &mut i64, value: i64) -> i64 {
        *factor * value
    }

    #[test]
    fn test_invoke_updates_captured_state() {
        let mut running = Closure::new(0i64, accumulate);
        assert_eq!(running.invoke(3), 3);
        assert_eq!(running.invoke(4), 7);
        assert_eq!(*running.state(), 7);
    }

    #[test]
    fn test_duplicate_detaches_state() {
        let mut original = Closure::new(10i64, accumulate);
        let mut copy = Duplicate::duplicate(&original).unwrap();
        original.invoke(5);
        assert_eq!(copy.invoke(1), 11);
        assert_eq!(original.into_state(), 15);
    }

    #[test]
    fn test_equality_requires_same_function_and_state() {
        let a = Closure::new(2i64, scale);
        let b = Closure::new(2i64, scale);
        let c = Closure::new(2i64, accumulate);
        assert_eq!(a, b);
        assert!(!a.same_function(&c));
        assert_ne!(a, c);
    }

    #[test]
    fn test_dispose_clears_owned_state() {
        fn push(log: &mut Vec<String>, line: &'static str) -> usize {
            log.push(line.to_string());
            log.len()
        }

        let mut logger = Closure::new(Vec::new(), push);
        logger.invoke("first");
        logger.dispose();
        assert!(logger.state().is_empty());
    }
}
