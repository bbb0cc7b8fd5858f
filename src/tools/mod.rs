pub mod curation;
pub mod image_tools;
pub mod log;
pub mod recognition;
