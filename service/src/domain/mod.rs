//! Domain definitions.

pub mod property;
pub mod rating;
pub mod user;

pub use self::{property::Property, rating::Rating};
