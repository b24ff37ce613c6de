pub mod category_models;
pub mod category_dto;
pub mod category_repository;
pub mod category_memory_repository;
pub mod category_service;
pub mod category_handlers;

pub use category_models::Category;
pub use category_dto::CreateCategoryRequest;
