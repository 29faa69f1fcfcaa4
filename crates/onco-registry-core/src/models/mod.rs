//! Domain models for the oncology registry.

mod booking;
mod diagnosis;
mod enums;
mod lookup;
mod patient;
mod staging;

pub use booking::*;
pub use diagnosis::*;
pub use enums::*;
pub use lookup::*;
pub use patient::*;
pub use staging::*;
