//! API request handlers

mod health;
mod projects;
mod sync;

pub use health::*;
pub use projects::*;
pub use sync::*;
