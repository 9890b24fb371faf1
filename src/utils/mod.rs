pub mod code_generator;
pub mod weighted;

pub use code_generator::generate_audit_token;
pub use weighted::{Weighted, pick_one};
