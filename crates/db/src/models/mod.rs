//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) where the entity is mutable

pub mod edited_video;
pub mod gif;
pub mod project;
pub mod user;
pub mod video;
