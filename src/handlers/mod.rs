//! HTTP handlers

pub mod defect_info;
pub mod detect;
pub mod health;
pub mod root;
