use thiserror::Error;

pub type Result<T, E = AttributeError> = core::result::Result<T, E>;

/// Failures of the dynamic attribute layers ([`Attributes`](crate::Attributes),
/// [`Declaration`](crate::Declaration), [`LazyObject`](crate::LazyObject)).
#[derive(Error, Debug)]
pub enum AttributeError {
   /// Two rules of one declaration, or two attributes of one instance, share a name.
   #[error("attribute `{name}` is declared more than once")]
   Duplicate { name: String },

   #[error("no attribute named `{name}`")]
   Missing { name: String },

   #[error("attribute `{name}` does not hold a value of type `{expected}`")]
   TypeMismatch { name: String, expected: &'static str },

   /// The compute function of `name` failed. The slot is still uncomputed.
   #[error("failed to compute attribute `{name}`")]
   Compute {
      name: String,
      #[source]
      source: anyhow::Error,
   },

   /// `name` was read from inside its own compute function.
   #[error("attribute `{name}` was read while it was being computed")]
   Cycle { name: String },

   #[error("attributes are frozen and do not accept assignment")]
   Frozen,

   #[error("attribute `{name}` is not one of the allowed attributes {allowed:?}")]
   NotAllowed { name: String, allowed: Vec<String> },

   #[error("cannot iterate: the set of attributes is unconstrained")]
   Unconstrained,

   /// The initializer wrapped by a declaration failed before the declaration ran.
   #[error("initializer failed")]
   Init(#[source] anyhow::Error),
}

impl AttributeError {
   pub(crate) fn missing(name: &str) -> Self {
      Self::Missing { name: name.to_owned() }
   }

   pub(crate) fn duplicate(name: &str) -> Self {
      Self::Duplicate { name: name.to_owned() }
   }

   pub(crate) fn type_mismatch<T>(name: &str) -> Self {
      Self::TypeMismatch {
         name: name.to_owned(),
         expected: core::any::type_name::<T>(),
      }
   }

   pub(crate) fn compute(name: &str, source: anyhow::Error) -> Self {
      Self::Compute {
         name: name.to_owned(),
         source,
      }
   }
}
