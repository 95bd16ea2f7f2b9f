pub mod models;
pub mod ocr;
pub mod research;
pub mod service;

pub use service::{AppState, create_app};
