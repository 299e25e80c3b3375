pub mod auth;
pub mod error;
pub mod role;

pub use role::{Capability, Role};
