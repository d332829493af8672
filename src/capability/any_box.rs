//! Type-erased value box

use std::any::{type_name, Any};
use std::fmt;

use crate::{Error, Result};

/// Owns a value of any `'static` type, remembering its type name.
///
/// Accessing the value as the wrong type fails with
/// [`Error::TypeMismatch`] instead of panicking.
pub struct AnyBox {
    value: Box<dyn Any>,
    type_name: &'static str,
}

impl AnyBox {
    /// Box `value`, erasing its type.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the stored value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the stored value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Result<&T> {
        let found = self.type_name;
        self.value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(found))
    }

    /// Mutably borrow the stored value as `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Result<&mut T> {
        let found = self.type_name;
        self.value
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(found))
    }

    /// Take the stored value out as `T`, handing the box back on mismatch.
    pub fn into_inner<T: Any>(self) -> std::result::Result<T, (Self, Error)> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err((Self { value, type_name }, mismatch::<T>(type_name))),
        }
    }
}

fn mismatch<T>(found: &'static str) -> Error {
    Error::TypeMismatch {
        expected: type_name::<T>(),
        found,
    }
}

impl fmt::Debug for AnyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyBox")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_round_trip() {
        let mut boxed = AnyBox::new(vec![1u8, 2, 3]);
        assert!(boxed.is::<Vec<u8>>());
        boxed.downcast_mut::<Vec<u8>>().unwrap().push(4);
        assert_eq!(boxed.downcast_ref::<Vec<u8>>().unwrap().len(), 4);
    }

    #[test]
    fn test_wrong_type_reports_mismatch() {
        let boxed = AnyBox::new(String::from("text"));
        match boxed.downcast_ref::<u32>() {
            Err(Error::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "u32");
                assert!(found.ends_with("String"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_into_inner_returns_box_on_mismatch() {
        let boxed = AnyBox::new(7i64);
        let (boxed, err) = boxed.into_inner::<i32>().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(boxed.into_inner::<i64>().unwrap(), 7);
    }
}
