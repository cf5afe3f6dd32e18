pub mod catalog;
pub mod funkit;
pub mod util;

pub use catalog::{CachingCatalog, CatalogState, StaticCatalog};
pub use funkit::FunkitProvider;
