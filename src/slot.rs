//! Per-instance storage of one lazy attribute.
//!
//! A [`LazySlot<T>`] is the cell an owning object keeps for each attribute it
//! computes on demand. The slot knows nothing about *how* the value is
//! computed; the compute function is handed in on every read, which lets a
//! single descriptor (see [`LazyProperty`](crate::LazyProperty)) drive the
//! slots of every instance of a type.
//!
//! A failed computation leaves the slot uncomputed, so the next read tries
//! again. A slot belongs to one thread: it can be moved to another thread but
//! never shared between two.

use core::cell::UnsafeCell;
use core::{fmt, mem};

use crate::state::{ComputeGuard, Reentrant, SlotState};

/// Cache of one lazily computed attribute value.
///
/// The slot starts uncomputed. The first `get_or_init`/`get_or_try_init`
/// runs the compute function and stores its result; every later read returns
/// the stored value. [`set`](Self::set) overwrites the cache at any point and
/// [`take`](Self::take) empties it again.
pub struct LazySlot<T> {
   value: UnsafeCell<mem::MaybeUninit<T>>,
   state: SlotState,
}

impl<T> LazySlot<T> {
   /// Creates an uncomputed slot.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         state: SlotState::uncomputed(),
         value: UnsafeCell::new(mem::MaybeUninit::uninit()),
      }
   }

   /// Creates a slot that already holds `value`; no compute function will run.
   #[inline]
   #[must_use]
   pub const fn with_value(value: T) -> Self {
      Self {
         state: SlotState::computed(),
         value: UnsafeCell::new(mem::MaybeUninit::new(value)),
      }
   }

   /// Returns `true` once the slot holds a value.
   #[inline]
   pub fn is_computed(&self) -> bool {
      self.state.is_computed()
   }

   /// Returns `true` while a compute function for this slot is running.
   #[inline]
   pub fn is_computing(&self) -> bool {
      self.state.is_computing()
   }

   /// Returns the cached value without computing it.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.is_computed() {
         // SAFETY: the slot is computed.
         Some(unsafe { self.get_unchecked() })
      } else {
         None
      }
   }

   /// Mutable access to the cached value, without computing it.
   #[inline]
   pub fn get_mut(&mut self) -> Option<&mut T> {
      if self.is_computed() {
         // SAFETY: the slot is computed and we have exclusive access.
         Some(unsafe { self.get_unchecked_mut() })
      } else {
         None
      }
   }

   /// Stores `value` in an uncomputed slot through a shared reference.
   ///
   /// Fails with the value handed back if the slot is already computed or a
   /// computation is running. Use [`set`](Self::set) to overwrite a computed
   /// slot.
   #[inline]
   pub fn try_set(&self, value: T) -> Result<&T, T> {
      let Ok(Some(guard)) = self.state.begin() else {
         return Err(value);
      };
      // SAFETY: the guard gives us exclusive write access.
      let stored = unsafe { (*self.value.get()).write(value) };
      guard.commit();
      Ok(stored)
   }

   /// Overwrites the cache with `value` and marks the slot computed.
   ///
   /// Returns the previously cached value, if any. Once set, no compute
   /// function runs for this slot until it is [taken](Self::take).
   #[inline]
   pub fn set(&mut self, value: T) -> Option<T> {
      let cell = self.value.get_mut();
      if self.state.mark_computed() {
         cell.write(value);
         None
      } else {
         // SAFETY: the slot was computed and we have exclusive access.
         let current = unsafe { cell.assume_init_mut() };
         Some(mem::replace(current, value))
      }
   }

   /// Empties the slot so the next read computes again.
   #[inline]
   pub fn take(&mut self) -> Option<T> {
      if self.state.mark_uncomputed() {
         // SAFETY: the slot was computed; the state no longer says so, so the
         // value is read out exactly once.
         unsafe { Some((*self.value.get()).assume_init_read()) }
      } else {
         None
      }
   }

   /// Returns the cached value, computing it with `f` on the first read.
   ///
   /// # Panics
   ///
   /// If `f` reads this same slot, like [`std::cell::OnceCell`] does. Use
   /// [`get_or_try_init_checked`](Self::get_or_try_init_checked) where a
   /// compute function may reach back into its own slot.
   #[inline]
   pub fn get_or_init<F>(&self, f: F) -> &T
   where
      F: FnOnce() -> T,
   {
      if let Some(value) = self.get() {
         return value;
      }
      match self.try_compute(|| Ok::<T, core::convert::Infallible>(f())) {
         // SAFETY: `try_compute` succeeded, so the slot is computed.
         Ok(()) => unsafe { self.get_unchecked() },
         Err(never) => match never {},
      }
   }

   /// Returns the cached value, computing it with the fallible `f` on the
   /// first read.
   ///
   /// An `Err` from `f` is returned untouched and the slot stays uncomputed,
   /// so a later read calls its compute function again.
   ///
   /// # Panics
   ///
   /// If `f` reads this same slot.
   pub fn get_or_try_init<F, E>(&self, f: F) -> Result<&T, E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      if let Some(value) = self.get() {
         return Ok(value);
      }
      self.try_compute(f)?;
      debug_assert!(self.is_computed());
      // SAFETY: `try_compute` succeeded, so the slot is computed.
      Ok(unsafe { self.get_unchecked() })
   }

   /// Like [`get_or_try_init`](Self::get_or_try_init), but a read from
   /// inside `f` of the slot `f` is computing returns `None` instead of
   /// panicking. The outer computation carries on and may still succeed.
   pub fn get_or_try_init_checked<F, E>(&self, f: F) -> Option<Result<&T, E>>
   where
      F: FnOnce() -> Result<T, E>,
   {
      if let Some(value) = self.get() {
         return Some(Ok(value));
      }
      match self.state.begin() {
         Ok(Some(guard)) => Some(self.fill(guard, f)),
         Ok(None) => self.get().map(Ok),
         Err(Reentrant) => None,
      }
   }

   /// Mutable access to the cached value, computing it with `f` first if needed.
   #[inline]
   pub fn get_mut_or_init<F>(&mut self, f: F) -> &mut T
   where
      F: FnOnce() -> T,
   {
      if !self.is_computed() {
         self.value.get_mut().write(f());
         self.state.mark_computed();
      }
      // SAFETY: computed above or before, exclusive access.
      unsafe { self.get_unchecked_mut() }
   }

   /// Mutable access to the cached value, computing it with the fallible `f`
   /// first if needed. On `Err` the slot stays uncomputed.
   pub fn get_mut_or_try_init<F, E>(&mut self, f: F) -> Result<&mut T, E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      if !self.is_computed() {
         self.value.get_mut().write(f()?);
         self.state.mark_computed();
      }
      // SAFETY: computed above or before, exclusive access.
      Ok(unsafe { self.get_unchecked_mut() })
   }

   /// # Safety
   ///
   /// The slot must be computed.
   #[inline]
   unsafe fn get_unchecked(&self) -> &T {
      debug_assert!(self.is_computed(), "read of an uncomputed LazySlot");
      unsafe { (*self.value.get()).assume_init_ref() }
   }

   /// # Safety
   ///
   /// The slot must be computed.
   #[inline]
   unsafe fn get_unchecked_mut(&mut self) -> &mut T {
      debug_assert!(self.is_computed(), "write through an uncomputed LazySlot");
      unsafe { self.value.get_mut().assume_init_mut() }
   }

   /// Runs `f` under `guard` and stores its value. On `Err` or panic the
   /// guard drops and the slot goes back to uncomputed.
   fn fill<F, E>(&self, guard: ComputeGuard<'_>, f: F) -> Result<&T, E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      let value = f()?;
      // SAFETY: the guard gives us exclusive write access, and nobody holds a
      // reference into an uncomputed slot.
      let stored = unsafe { (*self.value.get()).write(value) };
      guard.commit();
      Ok(&*stored)
   }

   #[cold]
   fn try_compute<F, E>(&self, f: F) -> Result<(), E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      match self.state.begin() {
         Ok(Some(guard)) => self.fill(guard, f).map(drop),
         Ok(None) => Ok(()),
         Err(Reentrant) => panic!("LazySlot read from inside its own compute function"),
      }
   }
}

impl<T> Default for LazySlot<T> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<T> From<T> for LazySlot<T> {
   #[inline]
   fn from(value: T) -> Self {
      Self::with_value(value)
   }
}

impl<T> From<Option<T>> for LazySlot<T> {
   fn from(value: Option<T>) -> Self {
      match value {
         Some(value) => Self::with_value(value),
         None => Self::new(),
      }
   }
}

impl<T: Clone> Clone for LazySlot<T> {
   /// Clones the cached value; an uncomputed slot clones to an uncomputed slot.
   #[inline]
   fn clone(&self) -> Self {
      self.get().cloned().into()
   }
}

impl<T: PartialEq> PartialEq for LazySlot<T> {
   #[inline]
   fn eq(&self, other: &Self) -> bool {
      self.get() == other.get()
   }
}

impl<T: Eq> Eq for LazySlot<T> {}

impl<T: fmt::Display> fmt::Display for LazySlot<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.get() {
         Some(v) => fmt::Display::fmt(v, f),
         None => f.write_str("<uncomputed>"),
      }
   }
}

impl<T: fmt::Debug> fmt::Debug for LazySlot<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("LazySlot");
      match self.get() {
         Some(v) => d.field(v),
         None => d.field(&format_args!("<uncomputed>")),
      };
      d.finish()
   }
}

impl<T> Drop for LazySlot<T> {
   #[inline]
   fn drop(&mut self) {
      if self.is_computed() {
         // SAFETY: computed, exclusive access, never read again.
         unsafe { self.value.get_mut().assume_init_drop() };
      }
   }
}
