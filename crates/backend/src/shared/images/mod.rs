//! Хранилище изображений категорий и подписанные ссылки на них.

pub mod signing;
pub mod storage;

pub use signing::{SignatureError, UrlSigner};
pub use storage::{get_store, initialize, ImageStore};
