pub mod character_service;
pub mod draw_service;
pub mod transaction_lock;
pub mod user_service;

pub use character_service::*;
pub use draw_service::*;
pub use transaction_lock::*;
pub use user_service::*;
