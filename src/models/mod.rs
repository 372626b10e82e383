//! Data models for the banner backend.

mod banner;
mod user;

pub use banner::*;
pub use user::*;
