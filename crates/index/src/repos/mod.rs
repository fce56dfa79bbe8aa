//! Repository traits for index operations.

pub mod catalog;
pub mod records;
pub mod roots;

pub use catalog::CatalogRepo;
pub use records::RecordRepo;
pub use roots::RepoRootRepo;
