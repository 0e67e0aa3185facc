//! Utility modules shared by the bundling pipeline.

pub mod io;
pub mod path;
