#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod overlay;
pub mod scheduler;
pub mod session;
pub mod time;

pub use error::Error;
pub use time::{Clock, PlaybackPosition};
