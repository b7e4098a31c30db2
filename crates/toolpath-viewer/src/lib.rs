//! Interactive CNC toolpath viewer library.
//!
//! Loads a toolpath off the UI thread, draws it as a single line strip with
//! a lightweight orbit camera, and dims everything above a height cutoff or
//! beyond a travel cutoff to replay machining progress.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod frame;
pub mod renderer;
pub mod transform;
pub mod ui;
