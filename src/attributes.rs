//! Dynamic per-instance attributes.
//!
//! [`Attributes`] is the attribute table of one object: an ordered mapping
//! from name to a type-erased [`LazySlot`]. Each entry is either a plain
//! value or a lazy attribute carrying the function that computes it. Compute
//! functions receive the table itself, so a lazy attribute may be derived from
//! its siblings.
//!
//! ```rust
//! use lazy_objects::Attributes;
//!
//! let mut attrs = Attributes::new();
//! attrs.set("first", String::from("Ada"))?;
//! attrs.define_lazy("greeting", |attrs| {
//!    format!("Hello {}", attrs.get::<String>("first").unwrap())
//! })?;
//!
//! assert!(!attrs.is_computed("greeting"));
//! assert_eq!(attrs.get::<String>("greeting")?, "Hello Ada");
//! # Ok::<(), lazy_objects::AttributeError>(())
//! ```

use core::any::{type_name, Any};
use core::fmt;
use std::borrow::Cow;
use std::rc::Rc;

use fxhash::FxHashMap;
use log::{debug, trace};

use crate::error::{AttributeError, Result};
use crate::slot::LazySlot;

/// Compute function of a lazy attribute holding a `T`.
pub(crate) type ComputeFn<T> = Rc<dyn Fn(&Attributes) -> anyhow::Result<T>>;

/// One typed attribute: its cache plus, for lazy attributes, how to fill it.
pub(crate) struct AttributeSlot<T> {
   slot: LazySlot<T>,
   compute: Option<ComputeFn<T>>,
}

impl<T> AttributeSlot<T> {
   pub(crate) fn value(value: T) -> Self {
      Self {
         slot: LazySlot::with_value(value),
         compute: None,
      }
   }

   pub(crate) fn lazy(compute: ComputeFn<T>) -> Self {
      Self {
         slot: LazySlot::new(),
         compute: Some(compute),
      }
   }
}

/// Type-erased view of an [`AttributeSlot`].
pub(crate) trait ErasedSlot {
   fn is_computed(&self) -> bool;
   fn is_lazy(&self) -> bool;
   /// Drops the cached value; returns whether there was one.
   fn clear(&mut self) -> bool;
   fn type_name(&self) -> &'static str;
   fn as_any(&self) -> &dyn Any;
   fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedSlot for AttributeSlot<T> {
   fn is_computed(&self) -> bool {
      self.slot.is_computed()
   }

   fn is_lazy(&self) -> bool {
      self.compute.is_some()
   }

   fn clear(&mut self) -> bool {
      self.slot.take().is_some()
   }

   fn type_name(&self) -> &'static str {
      type_name::<T>()
   }

   fn as_any(&self) -> &dyn Any {
      self
   }

   fn as_any_mut(&mut self) -> &mut dyn Any {
      self
   }
}

struct Entry {
   name: Cow<'static, str>,
   slot: Box<dyn ErasedSlot>,
}

/// Attribute table of one object instance.
///
/// Entries keep their insertion order. Nothing is shared between two tables:
/// computing an attribute of one instance never touches another instance's
/// cache.
#[derive(Default)]
pub struct Attributes {
   entries: Vec<Entry>,
   index: FxHashMap<Cow<'static, str>, usize>,
   frozen: bool,
}

impl Attributes {
   #[must_use]
   pub fn new() -> Self {
      Self::default()
   }

   pub fn len(&self) -> usize {
      self.entries.len()
   }

   pub fn is_empty(&self) -> bool {
      self.entries.is_empty()
   }

   pub fn contains(&self, name: &str) -> bool {
      self.index.contains_key(name)
   }

   /// Attribute names in insertion order.
   pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
      self.entries.iter().map(|entry| &*entry.name)
   }

   /// `true` if `name` exists and holds a value. Unknown names are not computed.
   pub fn is_computed(&self, name: &str) -> bool {
      self.entry(name).is_some_and(|entry| entry.slot.is_computed())
   }

   /// `true` if `name` exists and was defined with a compute function.
   pub fn is_lazy(&self, name: &str) -> bool {
      self.entry(name).is_some_and(|entry| entry.slot.is_lazy())
   }

   /// Rejects every later assignment, in-place mutation through
   /// [`get_mut`](Self::get_mut) and applying a declaration. Lazy attributes
   /// still compute on read.
   pub fn freeze(&mut self) {
      self.frozen = true;
   }

   pub fn is_frozen(&self) -> bool {
      self.frozen
   }

   /// Defines a lazy attribute computed by `compute` on its first read.
   pub fn define_lazy<T, F>(&mut self, name: impl Into<Cow<'static, str>>, compute: F) -> Result<()>
   where
      T: 'static,
      F: Fn(&Attributes) -> T + 'static,
   {
      self.try_define_lazy(name, move |attrs| Ok(compute(attrs)))
   }

   /// Defines a lazy attribute whose compute function can fail.
   ///
   /// A failed computation surfaces as [`AttributeError::Compute`] from the
   /// read that triggered it and leaves the attribute uncomputed.
   pub fn try_define_lazy<T, F>(
      &mut self,
      name: impl Into<Cow<'static, str>>,
      compute: F,
   ) -> Result<()>
   where
      T: 'static,
      F: Fn(&Attributes) -> anyhow::Result<T> + 'static,
   {
      let name = name.into();
      self.ensure_writable()?;
      if self.contains(&name) {
         return Err(AttributeError::duplicate(&name));
      }
      self.push(name, Box::new(AttributeSlot::lazy(Rc::new(compute))));
      Ok(())
   }

   /// Reads attribute `name`, computing it first if it is lazy and uncomputed.
   pub fn get<T: 'static>(&self, name: &str) -> Result<&T> {
      let slot = self.typed::<T>(name)?;
      if let Some(value) = slot.slot.get() {
         return Ok(value);
      }
      let Some(compute) = &slot.compute else {
         return Err(AttributeError::missing(name));
      };

      trace!("event=attribute_compute module=attributes status=start name={name}");
      let outcome = slot.slot.get_or_try_init_checked(|| compute(self));
      match outcome {
         Some(Ok(value)) => Ok(value),
         Some(Err(source)) => {
            debug!("event=attribute_compute module=attributes status=error name={name} error={source:#}");
            Err(AttributeError::compute(name, source))
         }
         None => Err(AttributeError::Cycle {
            name: name.to_owned(),
         }),
      }
   }

   /// Mutable access to attribute `name`, computing it first if needed.
   ///
   /// Changing a value in place is an assignment, so a frozen table refuses
   /// it with [`AttributeError::Frozen`].
   pub fn get_mut<T: 'static>(&mut self, name: &str) -> Result<&mut T> {
      self.ensure_writable()?;
      self.get::<T>(name)?;
      let slot = self.typed_mut::<T>(name)?;
      slot.slot.get_mut().ok_or_else(|| AttributeError::missing(name))
   }

   /// Returns the cached value of `name` without computing it.
   pub fn peek<T: 'static>(&self, name: &str) -> Result<Option<&T>> {
      Ok(self.typed::<T>(name)?.slot.get())
   }

   /// Assigns attribute `name`.
   ///
   /// An existing attribute must hold a `T`; its cache is overwritten and it
   /// counts as computed from now on, so a lazy attribute assigned before its
   /// first read never runs its compute function. A new name becomes a plain
   /// attribute. Returns the previously cached value.
   pub fn set<T: 'static>(&mut self, name: impl Into<Cow<'static, str>>, value: T) -> Result<Option<T>> {
      let name = name.into();
      self.ensure_writable()?;
      if self.contains(&name) {
         let slot = self.typed_mut::<T>(&name)?;
         return Ok(slot.slot.set(value));
      }
      self.push(name, Box::new(AttributeSlot::value(value)));
      Ok(None)
   }

   /// Assigns `name` only when `value` is `Some`.
   pub fn set_some<T: 'static>(
      &mut self,
      name: impl Into<Cow<'static, str>>,
      value: Option<T>,
   ) -> Result<Option<T>> {
      match value {
         Some(value) => self.set(name, value),
         None => Ok(None),
      }
   }

   /// Drops the cached value of `name`.
   ///
   /// A lazy attribute goes back to uncomputed and recomputes on its next
   /// read. A plain attribute has nothing to recompute from and is removed.
   /// Returns whether a value was dropped.
   pub fn reset(&mut self, name: &str) -> Result<bool> {
      self.ensure_writable()?;
      let Some(&at) = self.index.get(name) else {
         return Err(AttributeError::missing(name));
      };
      if self.entries[at].slot.is_lazy() {
         Ok(self.entries[at].slot.clear())
      } else {
         self.remove(name)?;
         Ok(true)
      }
   }

   /// Removes attribute `name` entirely, lazy or not.
   pub fn remove(&mut self, name: &str) -> Result<()> {
      self.ensure_writable()?;
      let Some(at) = self.index.remove(name) else {
         return Err(AttributeError::missing(name));
      };
      self.entries.remove(at);
      for position in self.index.values_mut() {
         if *position > at {
            *position -= 1;
         }
      }
      Ok(())
   }

   pub(crate) fn ensure_writable(&self) -> Result<()> {
      if self.frozen {
         return Err(AttributeError::Frozen);
      }
      Ok(())
   }

   /// Adds an entry. Callers have checked that `name` is new.
   pub(crate) fn push(&mut self, name: Cow<'static, str>, slot: Box<dyn ErasedSlot>) {
      debug_assert!(!self.contains(&name), "attribute `{name}` pushed twice");
      self.index.insert(name.clone(), self.entries.len());
      self.entries.push(Entry { name, slot });
   }

   fn entry(&self, name: &str) -> Option<&Entry> {
      self.index.get(name).map(|&at| &self.entries[at])
   }

   fn typed<T: 'static>(&self, name: &str) -> Result<&AttributeSlot<T>> {
      let entry = self.entry(name).ok_or_else(|| AttributeError::missing(name))?;
      entry
         .slot
         .as_any()
         .downcast_ref::<AttributeSlot<T>>()
         .ok_or_else(|| AttributeError::type_mismatch::<T>(name))
   }

   fn typed_mut<T: 'static>(&mut self, name: &str) -> Result<&mut AttributeSlot<T>> {
      let Some(&at) = self.index.get(name) else {
         return Err(AttributeError::missing(name));
      };
      self.entries[at]
         .slot
         .as_any_mut()
         .downcast_mut::<AttributeSlot<T>>()
         .ok_or_else(|| AttributeError::type_mismatch::<T>(name))
   }
}

impl fmt::Debug for Attributes {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut map = f.debug_map();
      for entry in &self.entries {
         let state = if entry.slot.is_computed() {
            "computed"
         } else {
            "uncomputed"
         };
         map.entry(
            &entry.name,
            &format_args!("{} ({state})", entry.slot.type_name()),
         );
      }
      map.finish()
   }
}
