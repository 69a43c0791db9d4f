pub mod review;
pub mod store;
