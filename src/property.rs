//! Lazy properties: one shared descriptor per attribute, one slot per instance.
//!
//! A [`LazyProperty<O, T, E>`] names an attribute of `O`, knows where the
//! attribute's [`LazySlot`] lives inside an `O`, and holds the function that
//! computes the value from the owner. The descriptor itself is stateless and
//! `const`-constructible, so the natural home for it is a `static` next to the
//! type it describes:
//!
//! ```rust
//! use lazy_objects::{LazyProperty, LazySlot};
//!
//! struct Circle {
//!    radius: f64,
//!    area: LazySlot<f64>,
//! }
//!
//! static AREA: LazyProperty<Circle, f64> = LazyProperty::new(
//!    "area",
//!    |c| &c.area,
//!    |c| &mut c.area,
//!    |c| core::f64::consts::PI * c.radius * c.radius,
//! );
//!
//! impl Circle {
//!    fn area(&self) -> f64 {
//!       *AREA.get(self)
//!    }
//! }
//!
//! let circle = Circle { radius: 2.0, area: LazySlot::new() };
//! assert!(!AREA.is_computed(&circle));
//! assert!((circle.area() - 12.566).abs() < 1e-3);
//! assert!(AREA.is_computed(&circle));
//! ```

use core::convert::Infallible;
use core::fmt;

use log::trace;

use crate::slot::LazySlot;

enum Compute<O, T, E> {
   Infallible(fn(&O) -> T),
   Fallible(fn(&O) -> Result<T, E>),
}

impl<O, T, E> Clone for Compute<O, T, E> {
   fn clone(&self) -> Self {
      *self
   }
}

impl<O, T, E> Copy for Compute<O, T, E> {}

/// Descriptor of a lazily computed attribute of `O`.
///
/// `E` is the error type of a fallible compute function; properties built
/// with [`new`](LazyProperty::new) use [`Infallible`] and get the plain
/// [`get`](LazyProperty::get).
pub struct LazyProperty<O, T, E = Infallible> {
   name: &'static str,
   slot: fn(&O) -> &LazySlot<T>,
   slot_mut: fn(&mut O) -> &mut LazySlot<T>,
   compute: Compute<O, T, E>,
}

impl<O, T> LazyProperty<O, T, Infallible> {
   /// Describes the attribute `name`, stored in the slot `slot`/`slot_mut`
   /// point at and computed by `compute`.
   #[must_use]
   pub const fn new(
      name: &'static str,
      slot: fn(&O) -> &LazySlot<T>,
      slot_mut: fn(&mut O) -> &mut LazySlot<T>,
      compute: fn(&O) -> T,
   ) -> Self {
      Self {
         name,
         slot,
         slot_mut,
         compute: Compute::Infallible(compute),
      }
   }

   /// Returns the attribute, computing it on the first read for `owner`.
   ///
   /// Panics on a re-entrant read, see [`try_get`](LazyProperty::try_get).
   #[inline]
   pub fn get<'o>(&self, owner: &'o O) -> &'o T {
      match self.try_get(owner) {
         Ok(value) => value,
         Err(never) => match never {},
      }
   }
}

impl<O, T, E> LazyProperty<O, T, E> {
   /// Describes an attribute whose compute function can fail.
   #[must_use]
   pub const fn fallible(
      name: &'static str,
      slot: fn(&O) -> &LazySlot<T>,
      slot_mut: fn(&mut O) -> &mut LazySlot<T>,
      compute: fn(&O) -> Result<T, E>,
   ) -> Self {
      Self {
         name,
         slot,
         slot_mut,
         compute: Compute::Fallible(compute),
      }
   }

   #[inline]
   pub const fn name(&self) -> &'static str {
      self.name
   }

   /// Returns the attribute, computing it on the first read for `owner`.
   ///
   /// A failure of the compute function is returned as-is and leaves the
   /// attribute uncomputed; the next read calls the function again.
   ///
   /// # Panics
   ///
   /// If the compute function reads this same property of `owner`, directly
   /// or through other properties. The panic unwinds through the outer
   /// computation, which leaves the attribute uncomputed.
   pub fn try_get<'o>(&self, owner: &'o O) -> Result<&'o T, E> {
      let outcome = (self.slot)(owner).get_or_try_init_checked(|| {
         trace!(
            "event=property_compute module=property status=start name={}",
            self.name
         );
         let result = match self.compute {
            Compute::Infallible(f) => Ok(f(owner)),
            Compute::Fallible(f) => f(owner),
         };
         if result.is_err() {
            trace!(
               "event=property_compute module=property status=error name={}",
               self.name
            );
         }
         result
      });
      match outcome {
         Some(result) => result,
         None => panic!(
            "lazy property `{}` read from inside its own compute function",
            self.name
         ),
      }
   }

   /// Returns the cached value of `owner`'s attribute without computing it.
   #[inline]
   pub fn peek<'o>(&self, owner: &'o O) -> Option<&'o T> {
      (self.slot)(owner).get()
   }

   #[inline]
   pub fn is_computed(&self, owner: &O) -> bool {
      (self.slot)(owner).is_computed()
   }

   /// Assigns the attribute of `owner`, replacing any cached value.
   ///
   /// The compute function is not called for `owner` afterwards unless the
   /// attribute is [reset](Self::reset).
   #[inline]
   pub fn set(&self, owner: &mut O, value: T) -> Option<T> {
      (self.slot_mut)(owner).set(value)
   }

   /// Drops the cached value of `owner`'s attribute; the next read recomputes.
   #[inline]
   pub fn reset(&self, owner: &mut O) -> Option<T> {
      (self.slot_mut)(owner).take()
   }
}

impl<O, T, E> Clone for LazyProperty<O, T, E> {
   fn clone(&self) -> Self {
      *self
   }
}

impl<O, T, E> Copy for LazyProperty<O, T, E> {}

impl<O, T, E> fmt::Debug for LazyProperty<O, T, E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("LazyProperty")
         .field("name", &self.name)
         .field("owner", &core::any::type_name::<O>())
         .field("value", &core::any::type_name::<T>())
         .finish()
   }
}
