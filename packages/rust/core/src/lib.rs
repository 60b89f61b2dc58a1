//! Core build orchestration and navigation logic for pipeviz.
//!
//! This crate ties together discovery, page rendering, version grouping, and
//! navigation assembly into the end-to-end `build` workflow.

pub mod build;
pub mod grouping;
pub mod nav;
pub mod nav_io;
pub mod registry;
pub mod version;

pub use build::{
    BuildReport, ProcessedFile, ProgressReporter, SilentProgress, Visualizer, VisualizerConfig,
};
pub use grouping::{GroupingOffset, group_path};
pub use nav::{SectionLabels, locate_or_create, populate_section, update_navigation};
pub use registry::{GroupingOffsets, Registries, VersionEntry, VersionRegistry};
pub use version::VersionKey;
