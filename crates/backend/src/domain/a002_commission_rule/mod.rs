pub mod conflicts;
pub mod formula;
pub mod repository;
pub mod service;
