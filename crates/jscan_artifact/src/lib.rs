// jscan_artifact - Compilation artifact records and list serialization
//! This crate provides the artifact data model shared by the scanning
//! tools: the [`Artifact`] record, the [`ArtifactList`] container and the
//! pluggable list serializers (text, JSON, XML).

// Module declarations
pub mod artifact;
pub mod writer;

// Re-export all public types for convenient access
pub use artifact::*;
pub use writer::*;
