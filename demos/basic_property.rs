use lazy_objects::{LazyProperty, LazySlot};

struct Document {
   text: String,
   word_count: LazySlot<usize>,
}

static WORD_COUNT: LazyProperty<Document, usize> = LazyProperty::new(
   "word_count",
   |doc| &doc.word_count,
   |doc| &mut doc.word_count,
   |doc| {
      println!("Counting words...");
      doc.text.split_whitespace().count()
   },
);

fn main() {
   let mut doc = Document {
      text: String::from("the quick brown fox"),
      word_count: LazySlot::new(),
   };

   // Nothing has been computed yet
   assert!(!WORD_COUNT.is_computed(&doc));

   // The first read counts, the second one hits the cache
   println!("Words: {}", WORD_COUNT.get(&doc));
   println!("Words again: {}", WORD_COUNT.get(&doc));

   // Resetting forces a recount on the next read
   doc.text.push_str(" jumps");
   WORD_COUNT.reset(&mut doc);
   println!("Words after edit: {}", WORD_COUNT.get(&doc));
   assert_eq!(*WORD_COUNT.get(&doc), 5);
}
