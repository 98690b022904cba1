//! Record mirror: live subscription, optimistic deletes and derived views.

pub mod add_record;
pub mod delete_record;
pub mod facade;
pub mod overlay;
pub mod subscription;

pub use add_record::{AddRecord, AddRecordError};
pub use delete_record::{DeleteRecord, DeleteRecordError};
pub use facade::RecordsFacade;
pub use overlay::OptimisticOverlay;
pub use subscription::{RecordSubscription, SubscriptionError, SyncIssue};
