use std::cell::Cell;
use std::rc::Rc;

use anyhow::anyhow;
use lazy_objects::{AttributeError, Attributes};

fn counted(counter: &Rc<Cell<usize>>) -> impl Fn(&Attributes) -> i32 + 'static {
   let counter = Rc::clone(counter);
   move |_| {
      counter.set(counter.get() + 1);
      42
   }
}

#[test]
fn test_lazy_attribute_computes_once() -> anyhow::Result<()> {
   let counter = Rc::new(Cell::new(0));
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", counted(&counter))?;

   assert!(attrs.is_lazy("answer"));
   assert!(!attrs.is_computed("answer"));
   assert_eq!(counter.get(), 0);

   for _ in 0..4 {
      assert_eq!(*attrs.get::<i32>("answer")?, 42);
   }
   assert!(attrs.is_computed("answer"));
   assert_eq!(counter.get(), 1);
   Ok(())
}

#[test]
fn test_instances_are_isolated() -> anyhow::Result<()> {
   let counter = Rc::new(Cell::new(0));
   let mut a = Attributes::new();
   let mut b = Attributes::new();
   a.define_lazy("answer", counted(&counter))?;
   b.define_lazy("answer", counted(&counter))?;

   a.get::<i32>("answer")?;
   assert!(a.is_computed("answer"));
   assert!(!b.is_computed("answer"));

   b.set("answer", 7)?;
   assert_eq!(*a.get::<i32>("answer")?, 42);
   assert_eq!(*b.get::<i32>("answer")?, 7);
   assert_eq!(counter.get(), 1);
   Ok(())
}

#[test]
fn test_compute_reads_sibling_attributes() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.set("a", 1_i64)?;
   attrs.try_define_lazy("bar", |attrs| Ok(*attrs.get::<i64>("a")? + 4))?;
   assert_eq!(*attrs.get::<i64>("bar")?, 5);
   Ok(())
}

#[test]
fn test_write_before_read_skips_compute() -> anyhow::Result<()> {
   let counter = Rc::new(Cell::new(0));
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", counted(&counter))?;

   assert_eq!(attrs.set("answer", 1)?, None);
   assert!(attrs.is_computed("answer"));
   assert_eq!(*attrs.get::<i32>("answer")?, 1);
   assert_eq!(counter.get(), 0);
   Ok(())
}

#[test]
fn test_write_after_read_overwrites() -> anyhow::Result<()> {
   let counter = Rc::new(Cell::new(0));
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", counted(&counter))?;

   attrs.get::<i32>("answer")?;
   assert_eq!(attrs.set("answer", 2)?, Some(42));
   assert_eq!(*attrs.get::<i32>("answer")?, 2);
   assert_eq!(counter.get(), 1);
   Ok(())
}

#[test]
fn test_failure_does_not_poison() -> anyhow::Result<()> {
   let available = Rc::new(Cell::new(false));
   let attempts = Rc::new(Cell::new(0));
   let mut attrs = Attributes::new();
   {
      let available = Rc::clone(&available);
      let attempts = Rc::clone(&attempts);
      attrs.try_define_lazy("config", move |_| {
         attempts.set(attempts.get() + 1);
         if available.get() {
            Ok(String::from("loaded"))
         } else {
            Err(anyhow!("config service unavailable"))
         }
      })?;
   }

   let err = attrs.get::<String>("config").unwrap_err();
   match &err {
      AttributeError::Compute { name, source } => {
         assert_eq!(name, "config");
         assert_eq!(source.to_string(), "config service unavailable");
      }
      other => panic!("unexpected error: {other:?}"),
   }
   assert!(!attrs.is_computed("config"));

   available.set(true);
   assert_eq!(attrs.get::<String>("config")?, "loaded");
   assert_eq!(attempts.get(), 2);
   Ok(())
}

#[test]
fn test_self_reference_is_a_cycle() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.try_define_lazy("loop", |attrs| Ok(*attrs.get::<i32>("loop")? + 1))?;

   let source = match attrs.get::<i32>("loop") {
      Err(AttributeError::Compute { source, .. }) => source,
      other => panic!("expected a compute error, got {other:?}"),
   };
   assert!(matches!(
      source.downcast_ref::<AttributeError>(),
      Some(AttributeError::Cycle { name }) if name == "loop"
   ));
   assert!(!attrs.is_computed("loop"));
   Ok(())
}

#[test]
fn test_mutual_reference_is_a_cycle() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.try_define_lazy("a", |attrs| Ok(*attrs.get::<i32>("b")? + 1))?;
   attrs.try_define_lazy("b", |attrs| Ok(*attrs.get::<i32>("a")? + 1))?;

   let outer = match attrs.get::<i32>("a") {
      Err(AttributeError::Compute { name, source }) if name == "a" => source,
      other => panic!("expected a compute error for `a`, got {other:?}"),
   };
   let inner = match outer.downcast_ref::<AttributeError>() {
      Some(AttributeError::Compute { name, source }) if name == "b" => source,
      other => panic!("expected a compute error for `b`, got {other:?}"),
   };
   assert!(matches!(
      inner.downcast_ref::<AttributeError>(),
      Some(AttributeError::Cycle { name }) if name == "a"
   ));
   assert!(!attrs.is_computed("a"));
   assert!(!attrs.is_computed("b"));

   attrs.set("b", 1)?;
   assert_eq!(*attrs.get::<i32>("a")?, 2);
   Ok(())
}

#[test]
fn test_duplicate_definition_is_rejected() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.define_lazy("x", |_| 1)?;
   assert!(matches!(
      attrs.define_lazy("x", |_| 2),
      Err(AttributeError::Duplicate { name }) if name == "x"
   ));
   Ok(())
}

#[test]
fn test_missing_and_mismatched() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.set("n", 1_u8)?;

   assert!(matches!(
      attrs.get::<u8>("m"),
      Err(AttributeError::Missing { name }) if name == "m"
   ));
   assert!(matches!(
      attrs.get::<String>("n"),
      Err(AttributeError::TypeMismatch { name, .. }) if name == "n"
   ));
   assert!(matches!(
      attrs.set("n", String::new()),
      Err(AttributeError::TypeMismatch { .. })
   ));
   Ok(())
}

#[test]
fn test_reset_recomputes_lazy_and_removes_plain() -> anyhow::Result<()> {
   let counter = Rc::new(Cell::new(0));
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", counted(&counter))?;
   attrs.set("plain", 1_u32)?;

   attrs.get::<i32>("answer")?;
   assert!(attrs.reset("answer")?);
   assert!(!attrs.is_computed("answer"));
   attrs.get::<i32>("answer")?;
   assert_eq!(counter.get(), 2);

   assert!(attrs.reset("plain")?);
   assert!(!attrs.contains("plain"));
   assert!(matches!(attrs.reset("plain"), Err(AttributeError::Missing { .. })));
   Ok(())
}

#[test]
fn test_names_keep_insertion_order() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.set("c", 3)?;
   attrs.define_lazy("a", |_| 1)?;
   attrs.set("b", 2)?;
   assert_eq!(attrs.names().collect::<Vec<_>>(), ["c", "a", "b"]);

   attrs.remove("c")?;
   assert_eq!(attrs.names().collect::<Vec<_>>(), ["a", "b"]);
   assert_eq!(*attrs.get::<i32>("b")?, 2);
   assert_eq!(attrs.len(), 2);
   Ok(())
}

#[test]
fn test_get_mut_and_peek() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.define_lazy("items", |_| vec![1, 2])?;
   assert_eq!(attrs.peek::<Vec<i32>>("items")?, None);

   attrs.get_mut::<Vec<i32>>("items")?.push(3);
   assert_eq!(attrs.peek::<Vec<i32>>("items")?, Some(&vec![1, 2, 3]));
   Ok(())
}

#[test]
fn test_set_some_skips_none() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.set_some("world", None::<String>)?;
   attrs.set_some("hello", Some(String::from("there")))?;
   assert!(!attrs.contains("world"));
   assert_eq!(attrs.get::<String>("hello")?, "there");
   Ok(())
}

#[test]
fn test_frozen_rejects_assignment_but_computes() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", |_| 42)?;
   attrs.freeze();

   assert!(attrs.is_frozen());
   assert!(matches!(attrs.set("answer", 1), Err(AttributeError::Frozen)));
   assert!(matches!(attrs.define_lazy("other", |_| 0), Err(AttributeError::Frozen)));
   assert_eq!(*attrs.get::<i32>("answer")?, 42);
   assert!(matches!(attrs.get_mut::<i32>("answer"), Err(AttributeError::Frozen)));
   assert_eq!(*attrs.get::<i32>("answer")?, 42);
   Ok(())
}

#[test]
fn test_debug_lists_state() -> anyhow::Result<()> {
   let mut attrs = Attributes::new();
   attrs.define_lazy("answer", |_| 42_i32)?;
   let debug = format!("{attrs:?}");
   assert!(debug.contains("\"answer\": i32 (uncomputed)"), "{debug}");
   Ok(())
}
