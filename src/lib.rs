//! Lazily computed object attributes.
//!
//! An attribute is *lazy* when its value is computed the first time it is
//! read, cached on the instance that owns it, and returned from the cache on
//! every later read. This crate provides that mechanism in a few shapes:
//!
//! - [`LazySlot<T>`]: the per-instance cache of one attribute. `get_or_init`
//!   computes on first read, `set` overwrites, `take` resets.
//! - [`LazyProperty<O, T, E>`]: a `static` descriptor for a lazy field of a
//!   struct `O`, shared by every instance and holding no state of its own.
//! - [`Attributes`]: a dynamic attribute table for one instance, mapping names
//!   to type-erased lazy slots.
//! - [`Declaration`]: a batch of eager and lazy attribute rules, checked once
//!   and applied to every instance at construction.
//! - [`LazyObject<T>`]: an object whose attributes are all computed from their
//!   names by one function.
//!
//! A compute function runs at most once per instance and attribute unless the
//! attribute is explicitly reset. When it fails, the error reaches the reader
//! and the attribute stays uncomputed, so the next read tries again.
//!
//! # Examples
//!
//! ## Lazy property
//!
//! ```rust
//! use lazy_objects::{LazyProperty, LazySlot};
//!
//! struct Report {
//!    rows: Vec<u32>,
//!    total: LazySlot<u32>,
//! }
//!
//! static TOTAL: LazyProperty<Report, u32> =
//!    LazyProperty::new("total", |r| &r.total, |r| &mut r.total, |r| r.rows.iter().sum());
//!
//! let mut report = Report { rows: vec![1, 2, 3], total: LazySlot::new() };
//! assert_eq!(*TOTAL.get(&report), 6);
//!
//! // Assignment replaces the cached value.
//! TOTAL.set(&mut report, 10);
//! assert_eq!(*TOTAL.get(&report), 10);
//! ```
//!
//! ## Declared attributes
//!
//! ```rust
//! use lazy_objects::Declaration;
//!
//! let point = Declaration::builder()
//!    .eager("x", 3.0_f64)
//!    .eager("y", 4.0_f64)
//!    .lazy("norm", |attrs| {
//!       let x = *attrs.get::<f64>("x").unwrap();
//!       let y = *attrs.get::<f64>("y").unwrap();
//!       (x * x + y * y).sqrt()
//!    })
//!    .build()?;
//!
//! let p = point.construct()?;
//! assert!(!p.is_computed("norm"));
//! assert_eq!(*p.get::<f64>("norm")?, 5.0);
//! # Ok::<(), lazy_objects::AttributeError>(())
//! ```

/// Batch attribute declarations.
mod declaration;

/// Dynamic per-instance attribute tables.
mod attributes;

mod error;

/// Name-computed objects.
mod lazy_object;

/// Static lazy property descriptors.
mod property;

/// Per-instance lazy cell.
mod slot;

/// Internal compute-state machine.
mod state;

pub use attributes::Attributes;
pub use declaration::{Declaration, DeclarationBuilder, RuleKind};
pub use error::{AttributeError, Result};
pub use lazy_object::LazyObject;
pub use property::LazyProperty;
pub use slot::LazySlot;
