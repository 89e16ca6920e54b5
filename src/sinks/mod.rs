//! # Sinks
//!
//! Ready-made [`Sink`](crate::writer::Sink) implementations.
//!
//! - [`DirectorySink`]: copies artifacts into a local directory tree, one
//!   subdirectory per group membership.

mod directory;

pub use directory::{DeliveredArtifact, DirectorySink};
