#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod model;
pub mod quiz;
pub mod streak;
pub mod time;
pub mod translation;

pub use error::Error;
pub use time::Clock;
