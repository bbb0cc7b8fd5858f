pub mod candidate;
pub mod face;
pub mod photo;
