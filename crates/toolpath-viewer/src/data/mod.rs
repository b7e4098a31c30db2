// src/data/mod.rs
//! Data handling modules for the toolpath viewer.
//!
//! This module provides functionality for:
//! - Fetching toolpaths off the UI thread, discarding superseded responses.
//! - Defining the data structures for GPU buffers.

pub mod loader;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::loader::{
    AbortSignal, FileSource, LoadError, LoadState, LoadedToolpath, RequestId, ToolpathLoader,
    ToolpathSource,
};
pub use self::types::{ToolpathUniform, ToolpathVertex};
