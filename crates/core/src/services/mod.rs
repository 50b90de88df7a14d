pub mod event_service;
pub mod history_service;
pub mod input_service;
pub mod register_service;
