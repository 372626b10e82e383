//! Use-case layer between the HTTP handlers and the stores.
//!
//! Services know nothing about SQL; they validate, delegate and sanitize.

mod banner;
mod user;

pub use banner::*;
pub use user::*;
