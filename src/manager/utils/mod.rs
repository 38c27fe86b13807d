//! Shared helpers for the pipeline stages.

pub mod archive;
pub mod checksum;
pub mod fs;
pub mod http;
pub mod process;
