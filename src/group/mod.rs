pub mod group_models;
pub mod group_dto;
pub mod group_repository;
pub mod group_memory_repository;
pub mod group_service;
pub mod group_handlers;

pub use group_models::{CategoryCount, GroupResponse, GroupStats, GroupStatus, Member};
pub use group_dto::{CreateGroupRequest, MessageResponse, UpdateGroupRequest};
