//! Batch declaration of eager and lazy attributes.
//!
//! A [`Declaration`] lists, once, the attributes every instance of some kind
//! of object carries and how each one gets its value:
//!
//! - [`RuleKind::Eager`]: a value cloned into each new instance,
//! - [`RuleKind::EagerFactory`]: a function run while the instance is built,
//! - [`RuleKind::Lazy`]: a function run on the attribute's first read.
//!
//! Declarations are checked when they are built (a name used twice is an
//! error before any instance exists) and are then applied to as many
//! instances as needed.
//!
//! ```rust
//! use lazy_objects::Declaration;
//!
//! let student = Declaration::builder()
//!    .eager("name", String::from("Ada"))
//!    .lazy("greeting", |attrs| {
//!       format!("Bonjour {}", attrs.get::<String>("name").unwrap())
//!    })
//!    .build()?;
//!
//! let ada = student.construct()?;
//! assert_eq!(ada.get::<String>("greeting")?, "Bonjour Ada");
//!
//! let grace = student.construct_with(|attrs| {
//!    attrs.set("name", String::from("Grace"))?;
//!    Ok(())
//! })?;
//! assert_eq!(grace.get::<String>("greeting")?, "Bonjour Grace");
//! # Ok::<(), lazy_objects::AttributeError>(())
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::attributes::{AttributeSlot, Attributes, ErasedSlot};
use crate::error::{AttributeError, Result};

/// How a declared attribute obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
   Eager,
   EagerFactory,
   Lazy,
}

type Install = Rc<dyn Fn() -> anyhow::Result<Box<dyn ErasedSlot>>>;

fn installer<F>(install: F) -> Install
where
   F: Fn() -> anyhow::Result<Box<dyn ErasedSlot>> + 'static,
{
   Rc::new(install)
}

#[derive(Clone)]
struct Rule {
   name: Cow<'static, str>,
   kind: RuleKind,
   install: Install,
}

/// Collects attribute rules; [`build`](Self::build) validates them.
#[derive(Default)]
pub struct DeclarationBuilder {
   rules: Vec<Rule>,
}

impl DeclarationBuilder {
   #[must_use]
   pub fn new() -> Self {
      Self::default()
   }

   fn rule(mut self, name: Cow<'static, str>, kind: RuleKind, install: Install) -> Self {
      self.rules.push(Rule {
         name,
         kind,
         install,
      });
      self
   }

   /// Every instance starts with a clone of `value`.
   #[must_use]
   pub fn eager<T>(self, name: impl Into<Cow<'static, str>>, value: T) -> Self
   where
      T: Clone + 'static,
   {
      self.rule(
         name.into(),
         RuleKind::Eager,
         installer(move || Ok(Box::new(AttributeSlot::value(value.clone())) as Box<dyn ErasedSlot>)),
      )
   }

   /// `factory` runs once per instance, while the instance is constructed.
   #[must_use]
   pub fn eager_with<T, F>(self, name: impl Into<Cow<'static, str>>, factory: F) -> Self
   where
      T: 'static,
      F: Fn() -> T + 'static,
   {
      self.try_eager_with(name, move || Ok(factory()))
   }

   /// Like [`eager_with`](Self::eager_with); a failing factory fails the
   /// construction of the instance.
   #[must_use]
   pub fn try_eager_with<T, F>(self, name: impl Into<Cow<'static, str>>, factory: F) -> Self
   where
      T: 'static,
      F: Fn() -> anyhow::Result<T> + 'static,
   {
      self.rule(
         name.into(),
         RuleKind::EagerFactory,
         installer(move || Ok(Box::new(AttributeSlot::value(factory()?)) as Box<dyn ErasedSlot>)),
      )
   }

   /// `compute` runs on the first read of the attribute, separately for each
   /// instance.
   #[must_use]
   pub fn lazy<T, F>(self, name: impl Into<Cow<'static, str>>, compute: F) -> Self
   where
      T: 'static,
      F: Fn(&Attributes) -> T + 'static,
   {
      self.try_lazy(name, move |attrs| Ok(compute(attrs)))
   }

   /// Like [`lazy`](Self::lazy) with a compute function that can fail.
   #[must_use]
   pub fn try_lazy<T, F>(self, name: impl Into<Cow<'static, str>>, compute: F) -> Self
   where
      T: 'static,
      F: Fn(&Attributes) -> anyhow::Result<T> + 'static,
   {
      let compute: Rc<dyn Fn(&Attributes) -> anyhow::Result<T>> = Rc::new(compute);
      self.rule(
         name.into(),
         RuleKind::Lazy,
         installer(move || Ok(Box::new(AttributeSlot::lazy(compute.clone())) as Box<dyn ErasedSlot>)),
      )
   }

   /// Validates the rules. Fails with [`AttributeError::Duplicate`] on the
   /// first name declared twice.
   pub fn build(self) -> Result<Declaration> {
      for (at, rule) in self.rules.iter().enumerate() {
         if self.rules[..at].iter().any(|earlier| earlier.name == rule.name) {
            return Err(AttributeError::duplicate(&rule.name));
         }
      }
      Ok(Declaration {
         rules: self.rules.into(),
      })
   }
}

/// A validated, immutable set of attribute rules.
///
/// Cloning is cheap; clones share the rules and their functions.
#[derive(Clone)]
pub struct Declaration {
   rules: Rc<[Rule]>,
}

impl Declaration {
   #[must_use]
   pub fn builder() -> DeclarationBuilder {
      DeclarationBuilder::new()
   }

   pub fn len(&self) -> usize {
      self.rules.len()
   }

   pub fn is_empty(&self) -> bool {
      self.rules.is_empty()
   }

   /// Declared names and their kinds, in declaration order.
   pub fn rules(&self) -> impl Iterator<Item = (&str, RuleKind)> + '_ {
      self.rules.iter().map(|rule| (&*rule.name, rule.kind))
   }

   /// Installs the declared attributes on `attrs`, in declaration order.
   ///
   /// Names `attrs` already has are left untouched: whatever assigned them
   /// first wins. Eager factories run here; lazy rules are only wired up.
   ///
   /// A frozen `attrs` is rejected before anything is installed. A failing
   /// eager factory aborts the application with [`AttributeError::Compute`]
   /// and leaves `attrs` as it was: every slot is built before the first one
   /// is installed.
   pub fn apply(&self, attrs: &mut Attributes) -> Result<()> {
      attrs.ensure_writable()?;
      trace!(
         "event=declaration_apply module=declaration status=start rules={}",
         self.rules.len()
      );
      let mut staged = Vec::with_capacity(self.rules.len());
      for rule in self.rules.iter() {
         if attrs.contains(&rule.name) {
            trace!(
               "event=declaration_apply module=declaration status=skip name={}",
               rule.name
            );
            continue;
         }
         let slot = (rule.install)().map_err(|source| {
            debug!(
               "event=declaration_apply module=declaration status=error name={} error={source:#}",
               rule.name
            );
            AttributeError::compute(&rule.name, source)
         })?;
         staged.push((rule.name.clone(), slot));
      }
      for (name, slot) in staged {
         attrs.push(name, slot);
      }
      Ok(())
   }

   /// Builds a new instance carrying the declared attributes.
   pub fn construct(&self) -> Result<Attributes> {
      let mut attrs = Attributes::new();
      self.apply(&mut attrs)?;
      Ok(attrs)
   }

   /// Builds a new instance by running `init` and then applying the
   /// declaration.
   ///
   /// Attributes `init` assigns take precedence over declared rules of the
   /// same name.
   pub fn construct_with<F>(&self, init: F) -> Result<Attributes>
   where
      F: FnOnce(&mut Attributes) -> anyhow::Result<()>,
   {
      let mut attrs = Attributes::new();
      init(&mut attrs).map_err(AttributeError::Init)?;
      self.apply(&mut attrs)?;
      Ok(attrs)
   }

   /// Turns an initializer taking arguments `A` into a constructor that also
   /// installs the declared attributes, as [`construct_with`](Self::construct_with)
   /// does.
   pub fn wrap<A, F>(&self, init: F) -> impl Fn(A) -> Result<Attributes>
   where
      F: Fn(&mut Attributes, A) -> anyhow::Result<()>,
   {
      let declaration = self.clone();
      move |args| declaration.construct_with(|attrs| init(attrs, args))
   }
}

impl fmt::Debug for Declaration {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_map().entries(self.rules()).finish()
   }
}
