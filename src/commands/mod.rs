pub mod build;
pub mod config;
pub mod history;
pub mod patch;
