//! Track-matching and playlist-assembly pipeline.
//!
//! One search runs filter → sample → saved-status sync → assemble, strictly
//! in that order: assembly's pinned/matched dedupe depends on saved-status
//! eviction having already happened for the "saved tracks" source.

pub mod assembler;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod sampler;
pub mod types;

pub use engine::CurationEngine;
pub use errors::CurationError;
pub use types::{CurationSession, FilterSpec, SearchOutcome};
