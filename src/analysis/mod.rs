//! Analysis views over height fields
//!
//! This module provides read-only views derived from a field snapshot:
//! - Cross-section extraction (one grid row as a 1-D profile)
//! - Present-point and height-range helpers for plotting

pub mod cross_section;

pub use cross_section::{extract, CrossSection};
