pub mod action;
pub mod character;
pub mod common;
pub mod draw;
pub mod pagination;
pub mod user;

pub use action::*;
pub use character::*;
pub use common::*;
pub use draw::*;
pub use pagination::*;
pub use user::*;
