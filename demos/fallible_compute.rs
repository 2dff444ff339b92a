use std::cell::Cell;
use std::rc::Rc;

use anyhow::anyhow;
use lazy_objects::Attributes;

fn main() -> anyhow::Result<()> {
   let online = Rc::new(Cell::new(false));

   let mut attrs = Attributes::new();
   {
      let online = Rc::clone(&online);
      attrs.try_define_lazy("profile", move |_| {
         println!("Fetching profile (online={})...", online.get());
         if online.get() {
            Ok(String::from("ada@example.org"))
         } else {
            Err(anyhow!("profile service offline"))
         }
      })?;
   }

   // First attempt fails and leaves the attribute uncomputed
   match attrs.get::<String>("profile") {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {:#}", anyhow::Error::from(e)),
   }
   assert!(!attrs.is_computed("profile"));

   // Second attempt succeeds
   online.set(true);
   println!("Got profile: {}", attrs.get::<String>("profile")?);

   // Cached from now on, even if the service goes away again
   online.set(false);
   println!("Got profile again: {}", attrs.get::<String>("profile")?);
   Ok(())
}
