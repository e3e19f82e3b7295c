pub mod aggregate;
pub mod dto;
pub mod editing;
pub mod hierarchy;
pub mod history;
pub mod icons;
pub mod localization;
pub mod pending;
pub mod reorder;
pub mod statistics;
pub mod transfer;
pub mod tree;

pub use aggregate::{Category, CategoryLocalization, CategoryType, ENGLISH, SUPPORTED_LANGUAGES};
pub use dto::{BulkUpdateRequest, BulkUpdateResponse};
pub use editing::{CategoryGateway, CategoryWorkingSet, EditError, EditableCategory, SaveError};
pub use pending::{ImageChange, PendingChanges};
pub use reorder::{ReorderError, ReorderOptions};
pub use tree::TreeRow;
