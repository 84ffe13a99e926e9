//! Domain models and pure advisors for the Agricultural Advisory Platform

mod advisory;
mod disease;
mod farm;
mod fertilizer;
mod irrigation;
mod weather;

pub use advisory::*;
pub use disease::*;
pub use farm::*;
pub use fertilizer::*;
pub use irrigation::*;
pub use weather::*;
