pub mod event;
pub mod history;
pub mod sale;
pub mod settings;
pub mod sold_item;
