//! HTTP request handlers

pub mod advisory;
pub mod crop_advice;
pub mod health;
pub mod weather;

pub use advisory::*;
pub use crop_advice::*;
pub use health::*;
pub use weather::*;
