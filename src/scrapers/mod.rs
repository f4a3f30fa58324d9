pub mod population;

pub use population::{extract_population_rows, fetch_population_rows};
