//! earwatch-node: the EarWatch acoustic node
//!
//! Ties capture, framing and the alarm together in a single-threaded
//! super-loop, and provides the host-side frame extractor.

pub mod config;
pub mod error;
pub mod extract;
pub mod node;
pub mod startup;

pub use config::{NodeConfig, SchedulerConfig};
pub use error::NodeError;
pub use extract::{extract_frames, ExtractSummary, ExtractedFrame};
pub use node::{Node, NodeParts, TickReport};
