// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod state;
pub mod utils;

pub use error::{AppError, ErrorKind};
pub use state::AppState;
