//! Domain models for the weather and agronomics engine

mod agro;
mod field;
mod weather;

pub use agro::*;
pub use field::*;
pub use weather::*;
