use lazy_objects::{Attributes, Declaration};

fn main() -> anyhow::Result<()> {
   let student = Declaration::builder()
      .eager("school", String::from("Lycée Condorcet"))
      .eager_with("enrolled_at", || {
         println!("Stamping enrollment...");
         2024_u32
      })
      .lazy("greeting", |attrs| {
         println!("Building greeting...");
         let name = attrs.get::<String>("name").map(String::as_str).unwrap_or("stranger");
         format!("Bonjour {name}")
      })
      .build()?;

   let new_student = student.wrap(|attrs: &mut Attributes, name: &str| {
      attrs.set("name", name.to_owned())?;
      Ok(())
   });

   let ada = new_student("Ada")?;
   println!("{ada:?}");
   println!("{}", ada.get::<String>("greeting")?);
   println!("{}", ada.get::<String>("greeting")?);
   println!("{ada:?}");
   Ok(())
}
