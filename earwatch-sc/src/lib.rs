//! earwatch-sc: sound capture for the EarWatch node
//!
//! Provides:
//! - The `Microphone` capability and a WAV/in-memory replay backend
//! - Live capture through cpal (feature `cpal-input`)
//! - RMS energy gating
//! - The capture cycle: flush, timed read, gate, frame and transmit

pub mod capture_cycle;
pub mod config;
#[cfg(feature = "cpal-input")]
pub mod cpal_input;
pub mod energy_gate;
pub mod error;
pub mod microphone;

pub use capture_cycle::{CaptureCycle, CaptureStats, CycleOutcome};
pub use config::CaptureConfig;
#[cfg(feature = "cpal-input")]
pub use cpal_input::CpalMicrophone;
pub use energy_gate::{EnergyGate, GateDecision};
pub use error::AudioError;
pub use microphone::{Microphone, ReplayMicrophone};
