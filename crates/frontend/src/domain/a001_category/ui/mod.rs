pub mod edit_modal;
pub mod history;
pub mod manager;
pub mod statistics;
pub mod transfer;
pub mod translations;
pub mod tree;
pub mod view_model;

pub use manager::CategoryManager;
