pub mod activity_service;
pub mod auth_service;
pub mod file_service;
pub mod message_service;
pub mod user_service;
