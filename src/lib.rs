pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dump;
pub mod error;
pub mod load;
pub mod ui;

pub use error::LoadError;
