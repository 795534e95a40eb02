pub mod models;
pub mod pii;

pub use models::events::{ChangeAction, ChangeEvent};
pub use models::Table;
pub use pii::Masked;
