//! Library half of the `vwire-inspect` tool.
//!
//! Split from `main.rs` so the inspection pipeline can be tested without
//! spawning the binary.

pub mod config;
pub mod error;
pub mod hex;
pub mod listen;
pub mod report;

pub use config::{load_config, InspectConfig, OutputFormat};
pub use error::InspectError;
pub use report::{run_batch, FrameOutcome, FrameReport, Inspector, ReportSink, Summary, WriterSink};
