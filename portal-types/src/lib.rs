pub mod enums;
pub mod models;
pub mod unread;
pub mod validation;

pub use enums::*;
pub use models::*;
pub use unread::*;
pub use validation::ValidationResult;
