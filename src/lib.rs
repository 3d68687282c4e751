//! Pixfetch - An async image fetch-and-cache pipeline.
//!
//! This crate loads remote images for on-screen targets through a memory LRU cache, a
//! content-addressed disk store and the network, downscaling at decode time and running
//! loads on a bounded worker pool.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the image pipeline and configuration.
pub mod infrastructure;
/// Presentation layer containing display targets.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "pixfetch";
