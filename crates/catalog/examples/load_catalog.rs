use catalog::{Catalog, ClothingType};
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = Path::new("data/catalog.dat");

    println!("Loading catalog from {}...\n", path.display());

    let start = Instant::now();
    let catalog = Catalog::load_from_path(path)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Items: {}", catalog.len());
    for clothing_type in ClothingType::ALL {
        let count = catalog.items_by_type(clothing_type).len();
        if count > 0 {
            println!("  {:<12} {}", clothing_type, count);
        }
    }
}
