pub mod image_store;
pub mod memory;
pub mod user_repository;
