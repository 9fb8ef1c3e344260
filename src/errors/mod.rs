//! Error types shared across the HTTP surface.

pub mod app_error;

pub use app_error::{AppError, AppResult};
