pub mod store_repo;
pub use store_repo::{StoreCollection, StoreRepository};
pub mod review_repo;
pub use review_repo::{ReviewCollection, ReviewRepository};
pub mod memory;
pub use memory::MemoryDocumentStore;
