//! # Song Catalog
//!
//! The application ships with a bundled catalog file (`songs.json`) mapping
//! each song to the hosting-service folder that contains its chart archive.
//! This crate parses that file and offers folder-key lookup; filtering and
//! search stay in the host UI.

pub mod catalog;
pub mod error;
pub mod models;

pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use models::Song;
