pub mod config;
pub mod data;
pub mod error;
pub mod images;
pub mod logger;
