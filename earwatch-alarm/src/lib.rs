//! earwatch-alarm: the node's alarm
//!
//! Provides:
//! - Actuator capabilities (`DigitalOutput`, `RgbIndicator`) and host
//!   implementations that report through `tracing`
//! - `AlertFsm`, the tick-driven Idle/Active alert state machine

pub mod config;
pub mod error;
pub mod fsm;
pub mod outputs;

pub use config::AlarmConfig;
pub use error::AlarmError;
pub use fsm::{AlertFsm, AlertState, TickOutcome, VerdictOutcome};
pub use outputs::{AlarmOutputs, DigitalOutput, Rgb, RgbIndicator, TracedIndicator, TracedOutput};
