//! Axum handlers, one module per resource.

pub mod export;
pub mod gif;
pub mod media;
pub mod project;
pub mod upload;
pub mod user;

mod params;
