pub mod models;
pub mod pii;

pub use models::events::{InstantBookingSummary, ProviderNotification};
pub use pii::Masked;
