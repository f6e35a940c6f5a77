//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the
//! individual workspace crates. Host applications can depend on
//! `chartdl-workspace` with the `desktop-shims` feature and get the façade
//! plus the catalog and download types without wiring each crate
//! individually.

#[cfg(feature = "desktop-shims")]
pub use core_catalog as catalog;
#[cfg(feature = "desktop-shims")]
pub use core_download as download;
#[cfg(feature = "desktop-shims")]
pub use core_service as service;
