//! Objects whose attributes are all computed from their names.
//!
//! ```rust
//! use lazy_objects::LazyObject;
//!
//! let mut lengths = LazyObject::new(|name: &str| name.len()).constrained(["a", "bcd"])?;
//! assert_eq!(*lengths.get("bcd")?, 3);
//! assert!(lengths.get("xyz").is_err());
//!
//! let all: Vec<_> = lengths.iter()?.map(|(name, len)| (name.to_owned(), *len)).collect();
//! assert_eq!(all, [("a".to_owned(), 1), ("bcd".to_owned(), 3)]);
//! # Ok::<(), lazy_objects::AttributeError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use fxhash::FxHashMap;
use log::{debug, trace};

use crate::error::{AttributeError, Result};

/// An object with one compute function for every attribute.
///
/// Reading an attribute for the first time calls the function with the
/// attribute's name and caches the result. Without constraints any name can
/// be read; [`constrained`](Self::constrained) limits the readable names to a
/// fixed, ordered list, which also makes the object iterable.
///
/// A compute function built with [`try_new`](Self::try_new) may fail; the
/// failure reaches the reader as [`AttributeError::Compute`] and nothing is
/// cached, so the next read of that name calls the function again.
pub struct LazyObject<T> {
   compute: Box<dyn Fn(&str) -> anyhow::Result<T>>,
   allowed: Option<Vec<String>>,
   values: FxHashMap<String, T>,
}

impl<T> LazyObject<T> {
   pub fn new<F>(compute: F) -> Self
   where
      F: Fn(&str) -> T + 'static,
   {
      Self::try_new(move |name| Ok(compute(name)))
   }

   pub fn try_new<F>(compute: F) -> Self
   where
      F: Fn(&str) -> anyhow::Result<T> + 'static,
   {
      Self {
         compute: Box::new(compute),
         allowed: None,
         values: FxHashMap::default(),
      }
   }

   /// Restricts the readable attributes to `names`, in that order.
   pub fn constrained<I, S>(mut self, names: I) -> Result<Self>
   where
      I: IntoIterator<Item = S>,
      S: Into<String>,
   {
      let mut allowed: Vec<String> = Vec::new();
      for name in names {
         let name = name.into();
         if allowed.contains(&name) {
            return Err(AttributeError::duplicate(&name));
         }
         allowed.push(name);
      }
      self.allowed = Some(allowed);
      Ok(self)
   }

   pub fn is_constrained(&self) -> bool {
      self.allowed.is_some()
   }

   /// Whether `name` may be read.
   pub fn allows(&self, name: &str) -> bool {
      match &self.allowed {
         Some(allowed) => allowed.iter().any(|candidate| candidate == name),
         None => true,
      }
   }

   pub fn is_computed(&self, name: &str) -> bool {
      self.values.contains_key(name)
   }

   /// Reads attribute `name`, computing it on first access.
   pub fn get(&mut self, name: &str) -> Result<&T> {
      if !self.values.contains_key(name) {
         if !self.allows(name) {
            return Err(AttributeError::NotAllowed {
               name: name.to_owned(),
               allowed: self.allowed.clone().unwrap_or_default(),
            });
         }
         let value = self.compute(name)?;
         self.values.insert(name.to_owned(), value);
      }
      self.values.get(name).ok_or_else(|| AttributeError::missing(name))
   }

   fn compute(&self, name: &str) -> Result<T> {
      trace!("event=object_compute module=lazy_object status=start name={name}");
      (self.compute)(name).map_err(|source| {
         debug!("event=object_compute module=lazy_object status=error name={name} error={source:#}");
         AttributeError::compute(name, source)
      })
   }

   /// Assigns attribute `name` directly, whether or not it is allowed to be
   /// computed. Returns the previously cached value.
   pub fn set(&mut self, name: impl Into<String>, value: T) -> Option<T> {
      self.values.insert(name.into(), value)
   }

   /// Drops the cached value of `name`; the next read recomputes it.
   pub fn reset(&mut self, name: &str) -> Option<T> {
      self.values.remove(name)
   }

   /// The constrained names, or the names cached so far (sorted) when
   /// unconstrained.
   pub fn names(&self) -> Vec<&str> {
      match &self.allowed {
         Some(allowed) => allowed.iter().map(String::as_str).collect(),
         None => {
            let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
            names.sort_unstable();
            names
         }
      }
   }

   /// Computes every constrained attribute and iterates over them in order.
   ///
   /// Fails with [`AttributeError::Unconstrained`] when no constraint was set,
   /// since the set of attributes is then unbounded. The first failing
   /// computation stops the walk; attributes computed before it stay cached.
   pub fn iter(&mut self) -> Result<impl Iterator<Item = (&str, &T)> + '_> {
      let Some(allowed) = &self.allowed else {
         return Err(AttributeError::Unconstrained);
      };
      for name in allowed {
         if !self.values.contains_key(name) {
            let value = self.compute(name)?;
            self.values.insert(name.clone(), value);
         }
      }
      let values = &self.values;
      Ok(allowed
         .iter()
         .filter_map(move |name| values.get_key_value(name.as_str()))
         .map(|(name, value)| (name.as_str(), value)))
   }
}

impl<T: fmt::Debug> fmt::Debug for LazyObject<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let computed: BTreeMap<&str, &T> = self
         .values
         .iter()
         .map(|(name, value)| (name.as_str(), value))
         .collect();
      f.debug_tuple("LazyObject").field(&computed).finish()
   }
}
