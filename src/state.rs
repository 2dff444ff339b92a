//! Compute state of one lazy slot.
//!
//! A slot moves between three states:
//!
//! ```text
//!   Uncomputed --begin--> Computing --commit--> Computed
//!        ^                    |                     |
//!        +---- guard dropped -+                     |
//!        +------------------- take -----------------+
//! ```
//!
//! Everything happens on the thread that owns the slot, so the state is a
//! plain [`Cell`]. `Computing` is only ever observed by code running inside
//! the slot's own compute function: a read that finds it is re-entrant.

use core::cell::Cell;
use core::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
   Uncomputed,
   Computing,
   Computed,
}

/// The slot was read from inside its own compute function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reentrant;

pub(crate) struct SlotState(Cell<State>);

impl SlotState {
   #[inline]
   pub(crate) const fn uncomputed() -> Self {
      Self(Cell::new(State::Uncomputed))
   }

   #[inline]
   pub(crate) const fn computed() -> Self {
      Self(Cell::new(State::Computed))
   }

   #[inline]
   pub(crate) fn is_computed(&self) -> bool {
      self.0.get() == State::Computed
   }

   #[inline]
   pub(crate) fn is_computing(&self) -> bool {
      self.0.get() == State::Computing
   }

   /// Marks the slot computed. Returns `true` if it held no value before.
   pub(crate) fn mark_computed(&self) -> bool {
      self.0.replace(State::Computed) != State::Computed
   }

   /// Marks the slot uncomputed. Returns `true` if it held a value before.
   pub(crate) fn mark_uncomputed(&self) -> bool {
      self.0.replace(State::Uncomputed) == State::Computed
   }

   /// Starts a computation.
   ///
   /// `Ok(None)` means there is nothing to compute. `Err(Reentrant)` means a
   /// computation of this slot is already running further up the stack.
   pub(crate) fn begin(&self) -> Result<Option<ComputeGuard<'_>>, Reentrant> {
      match self.0.get() {
         State::Computed => Ok(None),
         State::Computing => Err(Reentrant),
         State::Uncomputed => {
            self.0.set(State::Computing);
            Ok(Some(ComputeGuard { state: self }))
         }
      }
   }
}

/// A running computation. Dropped without [`commit`](Self::commit), because
/// the compute function failed or panicked, it puts the slot back to
/// uncomputed so the next read retries.
pub(crate) struct ComputeGuard<'a> {
   state: &'a SlotState,
}

impl ComputeGuard<'_> {
   pub(crate) fn commit(self) {
      self.state.0.set(State::Computed);
      mem::forget(self);
   }
}

impl Drop for ComputeGuard<'_> {
   fn drop(&mut self) {
      self.state.0.set(State::Uncomputed);
   }
}
