pub mod catalog;
pub mod id_allocator;
pub mod sled_catalog;

pub use catalog::{Catalog, CatalogError, SkinFilter};
pub use id_allocator::{IdAllocator, IdAllocatorError, OptimusParams};
pub use sled_catalog::SledCatalog;
