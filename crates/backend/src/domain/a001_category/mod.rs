pub mod csv_export;
pub mod history_repository;
pub mod repository;
pub mod service;
