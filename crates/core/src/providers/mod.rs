pub mod traits;

// Remote service implementations
pub mod loppis_api;
