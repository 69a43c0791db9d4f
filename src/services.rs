pub mod slug;
pub mod store_service;
pub use store_service::StoreService;
pub mod aggregation_service;
pub use aggregation_service::AggregationService;
