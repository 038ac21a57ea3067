//! ago: a personal image gallery backend.
//!
//! Images are tagged by category, rated and grouped into manual or smart
//! albums. Browsing goes through one filter pipeline in [`query`]: criteria
//! compile into a predicate tree, which is rendered to parameterised SQL and
//! executed with a sort order and an optional page window.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod logging;
pub mod query;

pub use error::{GalleryError, Result};
