//! Capability contracts consumed by the pipeline core
//!
//! - `Cleanup`: explicit, in-place release of owned resources
//! - `Duplicate`: fallible deep copy (types may opt out)
//! - `Closure`: function pointer bundled with captured state
//! - `AnyBox`: type-erased value with checked downcasts
//!
//! Structural equality is Rust's own `PartialEq`.

mod any_box;
mod closure;

pub use any_box::AnyBox;
pub use closure::Closure;

use std::rc::Rc;

use crate::Result;

/// Releases resources owned by a value without destroying the value itself.
///
/// After `dispose` the value must still be safe to drop. Memory is returned
/// to the allocator by `Drop` as usual; `dispose` is the hook for emptying
/// containers in place (e.g. through a `&mut T` yielded by an iterator).
pub trait Cleanup {
    /// Release every resource owned by `self`, leaving an empty value behind.
    fn dispose(&mut self);
}

/// Produces an independent deep copy of a value.
///
/// Owned substructures are re-allocated, so disposing the original never
/// affects the duplicate. Types that cannot be copied return
/// [`crate::Error::DuplicationUnsupported`].
pub trait Duplicate: Sized {
    /// Deep-copy `self`.
    fn duplicate(&self) -> Result<Self>;
}

macro_rules! impl_plain_capabilities {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Cleanup for $ty {
                fn dispose(&mut self) {}
            }

            impl Duplicate for $ty {
                fn duplicate(&self) -> Result<Self> {
                    Ok(*self)
                }
            }
        )*
    };
}

impl_plain_capabilities!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl Cleanup for String {
    fn dispose(&mut self) {
        self.clear();
        self.shrink_to_fit();
    }
}

impl Duplicate for String {
    fn duplicate(&self) -> Result<Self> {
        Ok(self.clone())
    }
}

impl<T: Cleanup> Cleanup for Vec<T> {
    fn dispose(&mut self) {
        for item in self.iter_mut() {
            item.dispose();
        }
        self.clear();
        self.shrink_to_fit();
    }
}

impl<T: Duplicate> Duplicate for Vec<T> {
    fn duplicate(&self) -> Result<Self> {
        self.iter().map(Duplicate::duplicate).collect()
    }
}

impl<T: Cleanup + ?Sized> Cleanup for Box<T> {
    fn dispose(&mut self) {
        (**self).dispose();
    }
}

impl<T: Duplicate> Duplicate for Box<T> {
    fn duplicate(&self) -> Result<Self> {
        Ok(Box::new((**self).duplicate()?))
    }
}

impl<T: Cleanup> Cleanup for Option<T> {
    fn dispose(&mut self) {
        if let Some(mut value) = self.take() {
            value.dispose();
        }
    }
}

impl<T: Duplicate> Duplicate for Option<T> {
    fn duplicate(&self) -> Result<Self> {
        self.as_ref().map(Duplicate::duplicate).transpose()
    }
}

// A fresh allocation, not another strong reference.
impl<T: Duplicate> Duplicate for Rc<T> {
    fn duplicate(&self) -> Result<Self> {
        Ok(Rc::new((**self).duplicate()?))
    }
}

impl<T: Cleanup + ?Sized> Cleanup for &mut T {
    fn dispose(&mut self) {
        (**self).dispose();
    }
}

// Shared references own nothing; the referent cannot change underneath them.
impl<T: ?Sized> Cleanup for &T {
    fn dispose(&mut self) {}
}

impl<T: ?Sized> Duplicate for &T {
    fn duplicate(&self) -> Result<Self> {
        Ok(*self)
    }
}

impl<A: Cleanup, B: Cleanup> Cleanup for (A, B) {
    fn dispose(&mut self) {
        self.0.dispose();
        self.1.dispose();
    }
}

impl<A: Duplicate, B: Duplicate> Duplicate for (A, B) {
    fn duplicate(&self) -> Result<Self> {
        Ok((self.0.duplicate()?, self.1.duplicate()?))
    }
}

impl<A: Duplicate, B: Duplicate, C: Duplicate> Duplicate for (A, B, C) {
    fn duplicate(&self) -> Result<Self> {
        Ok((self.0.duplicate()?, self.1.duplicate()?, self.2.duplicate()?))
    }
}
