// ABOUTME: Library exports for gifgrep modules for testing and external use
// ABOUTME: Makes internal modules available to the binary, integration tests and benchmarks

pub mod caps;
pub mod cli;
pub mod config;
pub mod constants;
pub mod decode;
pub mod image_protocols;
pub mod logging;
pub mod output;
pub mod preview;
pub mod tui;
