pub mod client;
pub mod loader;
pub mod models;
pub mod suggest;

pub use client::{CatalogSource, HttpCatalogSource, DEFAULT_CATALOG_URL};
pub use loader::CatalogLoader;
pub use models::{BrewStep, BrewingMethod, BrewingMethodsResponse};
pub use suggest::{available_flavors, find_method, suggest};
