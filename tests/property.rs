use std::cell::Cell;

use lazy_objects::{LazyProperty, LazySlot};

struct Foo {
   base: i32,
   computations: Cell<usize>,
   bar: LazySlot<Vec<i32>>,
}

impl Foo {
   fn new(base: i32) -> Self {
      Self {
         base,
         computations: Cell::new(0),
         bar: LazySlot::new(),
      }
   }
}

static BAR: LazyProperty<Foo, Vec<i32>> = LazyProperty::new(
   "bar",
   |foo| &foo.bar,
   |foo| &mut foo.bar,
   |foo| {
      foo.computations.set(foo.computations.get() + 1);
      vec![foo.base, foo.base + 1, foo.base + 2]
   },
);

#[test]
fn test_computes_at_most_once() {
   let foo = Foo::new(1);
   assert!(!BAR.is_computed(&foo));
   assert_eq!(BAR.peek(&foo), None);

   for _ in 0..3 {
      assert_eq!(BAR.get(&foo), &[1, 2, 3]);
   }
   assert!(BAR.is_computed(&foo));
   assert_eq!(foo.computations.get(), 1);
}

#[test]
fn test_instances_are_isolated() {
   let a = Foo::new(1);
   let b = Foo::new(10);

   assert_eq!(BAR.get(&a), &[1, 2, 3]);
   assert!(!BAR.is_computed(&b));
   assert_eq!(b.computations.get(), 0);

   assert_eq!(BAR.get(&b), &[10, 11, 12]);
   assert_eq!(a.computations.get(), 1);
   assert_eq!(b.computations.get(), 1);
}

#[test]
fn test_set_before_first_read() {
   let mut foo = Foo::new(1);
   assert_eq!(BAR.set(&mut foo, vec![4, 5, 6]), None);
   assert_eq!(BAR.get(&foo), &[4, 5, 6]);
   assert_eq!(foo.computations.get(), 0);
}

#[test]
fn test_set_after_read_overwrites() {
   let mut foo = Foo::new(1);
   BAR.get(&foo);
   assert_eq!(BAR.set(&mut foo, vec![4, 5, 6]), Some(vec![1, 2, 3]));
   assert_eq!(BAR.get(&foo), &[4, 5, 6]);
   assert_eq!(foo.computations.get(), 1);
}

#[test]
fn test_reset_recomputes() {
   let mut foo = Foo::new(1);
   BAR.set(&mut foo, vec![4, 5, 6]);
   assert_eq!(BAR.reset(&mut foo), Some(vec![4, 5, 6]));
   assert!(!BAR.is_computed(&foo));
   assert_eq!(BAR.get(&foo), &[1, 2, 3]);
   assert_eq!(foo.computations.get(), 1);
}

#[test]
fn test_name_and_debug() {
   assert_eq!(BAR.name(), "bar");
   let debug = format!("{BAR:?}");
   assert!(debug.contains("\"bar\""), "{debug}");
}

struct Sensor {
   online: Cell<bool>,
   reading: LazySlot<u32>,
}

#[derive(Debug, PartialEq)]
struct Offline;

static READING: LazyProperty<Sensor, u32, Offline> = LazyProperty::fallible(
   "reading",
   |s| &s.reading,
   |s| &mut s.reading,
   |s| if s.online.get() { Ok(21) } else { Err(Offline) },
);

#[test]
fn test_failure_propagates_and_retries() {
   let sensor = Sensor {
      online: Cell::new(false),
      reading: LazySlot::new(),
   };

   assert_eq!(READING.try_get(&sensor), Err(Offline));
   assert!(!READING.is_computed(&sensor));

   sensor.online.set(true);
   assert_eq!(READING.try_get(&sensor), Ok(&21));

   sensor.online.set(false);
   assert_eq!(READING.try_get(&sensor), Ok(&21));
}

struct Counter {
   seeded: Cell<bool>,
   next: LazySlot<u32>,
}

static NEXT: LazyProperty<Counter, u32> = LazyProperty::new(
   "next",
   |c| &c.next,
   |c| &mut c.next,
   |c| if c.seeded.get() { 1 } else { *NEXT.get(c) + 1 },
);

#[test]
#[should_panic(expected = "lazy property `next` read from inside its own compute function")]
fn test_self_read_panics() {
   let counter = Counter {
      seeded: Cell::new(false),
      next: LazySlot::new(),
   };
   NEXT.get(&counter);
}

#[test]
fn test_self_read_leaves_property_uncomputed() {
   let counter = Counter {
      seeded: Cell::new(false),
      next: LazySlot::new(),
   };
   let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| *NEXT.get(&counter)));
   assert!(result.is_err());
   assert!(!NEXT.is_computed(&counter));

   counter.seeded.set(true);
   assert_eq!(NEXT.get(&counter), &1);
}
