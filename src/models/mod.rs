//! Data models

pub mod defect;
pub mod detection;
pub mod health;

pub use defect::*;
pub use detection::*;
pub use health::*;
