#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]

pub use self::error::{Error, Result};

pub mod domain;
pub mod error;
pub mod model;
pub mod plugins;
pub mod tools;
