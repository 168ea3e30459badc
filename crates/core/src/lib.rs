//! Domain building blocks shared by the clipstudio crates.
//!
//! Nothing in here talks to the network or the database. The encoder runner
//! and export workspace do touch the local file system and child processes.

pub mod clip;
pub mod completion;
pub mod delegate;
pub mod error;
pub mod ffmpeg;
pub mod types;
pub mod workspace;
