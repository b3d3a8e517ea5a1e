pub mod error;
pub mod models;
pub mod services;
pub mod ui;

pub use error::ChatError;
