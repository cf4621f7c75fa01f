//! Detection Service
//!
//! Stateless per-request pipeline: validate → decode → infer → filter →
//! enrich → assemble. Every step is a fallible function returning
//! [`AppResult`](crate::AppResult); the first error aborts the request.

pub mod annotate;
pub mod detection;
pub mod upload;

pub use detection::DetectionService;
pub use upload::{UploadedFile, ALLOWED_CONTENT_TYPES};
